//! In-memory note registry.
//!
//! # Responsibility
//! - Hold process-lifetime notes behind explicit locks.
//! - Serve as the default registry for tests and embedded usage.
//!
//! # Invariants
//! - `aliases` only points at ids present in `notes`.
//! - `register`/`remove` hold the map write lock for their whole check+write.
//! - `append_revision` holds the map read lock plus the note lock, so a note
//!   cannot be removed mid-append and two appends cannot share an index.

use crate::model::note::{Note, NoteId};
use crate::registry::{parse_note_id, ConflictKey, NoteRegistry, RegistryError, RegistryResult};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Default)]
struct RegistryState {
    notes: HashMap<NoteId, Arc<Mutex<Note>>>,
    aliases: HashMap<String, NoteId>,
}

impl RegistryState {
    fn lookup_id(&self, key: &str) -> Option<NoteId> {
        if let Some(id) = parse_note_id(key).filter(|id| self.notes.contains_key(id)) {
            return Some(id);
        }
        self.aliases.get(key).copied()
    }

    fn lookup(&self, key: &str) -> RegistryResult<&Arc<Mutex<Note>>> {
        self.lookup_id(key)
            .and_then(|id| self.notes.get(&id))
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }
}

/// Thread-safe registry backed by two hash maps.
#[derive(Debug, Default)]
pub struct InMemoryNoteRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryNoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err(context: &'static str) -> RegistryError {
    RegistryError::LockPoisoned(context)
}

impl NoteRegistry for InMemoryNoteRegistry {
    fn resolve(&self, key: &str) -> RegistryResult<Note> {
        let state = self.state.read().map_err(|_| lock_err("registry read"))?;
        let note = state.lookup(key)?;
        let guard = note.lock().map_err(|_| lock_err("note read"))?;
        Ok(guard.clone())
    }

    fn register(&self, note: Note) -> RegistryResult<()> {
        let mut state = self.state.write().map_err(|_| lock_err("registry write"))?;
        let id = note.id();

        if state.notes.contains_key(&id) {
            return Err(RegistryError::Conflict(ConflictKey::Id(id)));
        }
        if let Some(alias) = note.alias() {
            let shadows_id =
                parse_note_id(alias).is_some_and(|other| state.notes.contains_key(&other));
            if shadows_id || state.aliases.contains_key(alias) {
                return Err(RegistryError::Conflict(ConflictKey::Alias(alias.to_string())));
            }
        }

        if let Some(alias) = note.alias() {
            state.aliases.insert(alias.to_string(), id);
        }
        state.notes.insert(id, Arc::new(Mutex::new(note)));
        debug!(
            "event=registry_register module=registry status=ok backend=memory note_id={} notes={}",
            id,
            state.notes.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> RegistryResult<Note> {
        let mut state = self.state.write().map_err(|_| lock_err("registry write"))?;
        let id = state
            .lookup_id(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let entry = state
            .notes
            .remove(&id)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let note = entry.lock().map_err(|_| lock_err("note remove"))?.clone();
        if let Some(alias) = note.alias() {
            state.aliases.remove(alias);
        }
        debug!(
            "event=registry_remove module=registry status=ok backend=memory note_id={} notes={}",
            id,
            state.notes.len()
        );
        Ok(note)
    }

    fn append_revision(&self, key: &str, content: &str, created_at: i64) -> RegistryResult<Note> {
        let state = self.state.read().map_err(|_| lock_err("registry read"))?;
        let entry = state.lookup(key)?;
        let mut note = entry.lock().map_err(|_| lock_err("note append"))?;
        let index = note.append_revision(content, created_at)?.index();
        debug!(
            "event=registry_append module=registry status=ok backend=memory note_id={} revision={}",
            note.id(),
            index
        );
        Ok(note.clone())
    }

    fn len(&self) -> RegistryResult<usize> {
        let state = self.state.read().map_err(|_| lock_err("registry read"))?;
        Ok(state.notes.len())
    }
}
