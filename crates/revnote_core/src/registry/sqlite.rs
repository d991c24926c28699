//! SQLite-backed note registry.
//!
//! # Responsibility
//! - Persist notes and their revision history across process restarts.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every mutation runs in one `IMMEDIATE` transaction.
//! - `notes.alias` is `UNIQUE`; `(note_id, idx)` is the revision primary key.
//! - Read paths reject invalid persisted state instead of masking it.
//!
//! # See also
//! - db/migrations/0001_init.sql

use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{Note, NoteId, NoteMetadata};
use crate::model::revision::{Revision, RevisionError, RevisionIndex, RevisionStore};
use crate::registry::{parse_note_id, ConflictKey, NoteRegistry, RegistryError, RegistryResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const REQUIRED_TABLES: [&str; 2] = ["notes", "revisions"];

/// Registry persisted in a migrated SQLite connection.
///
/// The connection sits behind a mutex; all callers are serialized.
pub struct SqliteNoteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteNoteRegistry {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the schema is not in place.
    pub fn try_new(conn: Connection) -> RegistryResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(&conn, table)? {
                return Err(RegistryError::MissingRequiredTable(table));
            }
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RegistryResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> RegistryResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RegistryError::LockPoisoned("sqlite connection"))
    }
}

impl NoteRegistry for SqliteNoteRegistry {
    fn resolve(&self, key: &str) -> RegistryResult<Note> {
        let conn = self.lock()?;
        let id = lookup_id(&conn, key)?.ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        load_note(&conn, &id)
    }

    fn register(&self, note: Note) -> RegistryResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id_text = note.id().to_string();

        if note_exists(&tx, &id_text)? {
            return Err(RegistryError::Conflict(ConflictKey::Id(note.id())));
        }
        if let Some(alias) = note.alias() {
            if alias_taken(&tx, alias)? {
                return Err(RegistryError::Conflict(ConflictKey::Alias(alias.to_string())));
            }
        }

        let metadata = note.metadata();
        tx.execute(
            "INSERT INTO notes (id, alias, created_at, updated_at, current_revision)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id_text,
                metadata.alias.as_deref(),
                metadata.created_at,
                metadata.updated_at,
                metadata.current_revision,
            ],
        )?;
        for revision in note.revisions().iter() {
            tx.execute(
                "INSERT INTO revisions (note_id, idx, content, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    id_text,
                    revision.index(),
                    revision.content(),
                    revision.created_at(),
                ],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=registry_register module=registry status=ok backend=sqlite note_id={} revisions={}",
            id_text,
            note.revisions().count()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> RegistryResult<Note> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = lookup_id(&tx, key)?.ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let note = load_note(&tx, &id)?;

        tx.execute("DELETE FROM revisions WHERE note_id = ?1;", [id.as_str()])?;
        tx.execute("DELETE FROM notes WHERE id = ?1;", [id.as_str()])?;
        tx.commit()?;

        debug!(
            "event=registry_remove module=registry status=ok backend=sqlite note_id={}",
            id
        );
        Ok(note)
    }

    fn append_revision(&self, key: &str, content: &str, created_at: i64) -> RegistryResult<Note> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = lookup_id(&tx, key)?.ok_or_else(|| RegistryError::NotFound(key.to_string()))?;

        let last: RevisionIndex = tx.query_row(
            "SELECT COALESCE(MAX(idx), 0) FROM revisions WHERE note_id = ?1;",
            [id.as_str()],
            |row| row.get(0),
        )?;
        let next = last
            .checked_add(1)
            .ok_or(RegistryError::Revision(RevisionError::IndexOverflow))?;

        tx.execute(
            "INSERT INTO revisions (note_id, idx, content, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![id, next, content, created_at],
        )?;
        tx.execute(
            "UPDATE notes
             SET current_revision = ?2, updated_at = ?3
             WHERE id = ?1;",
            params![id, next, created_at],
        )?;
        let note = load_note(&tx, &id)?;
        tx.commit()?;

        debug!(
            "event=registry_append module=registry status=ok backend=sqlite note_id={} revision={}",
            id, next
        );
        Ok(note)
    }

    fn len(&self) -> RegistryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RegistryError::InvalidData(format!("negative note count `{count}`")))
    }
}

/// Resolves `key` to a stored id text, id namespace first.
fn lookup_id(conn: &Connection, key: &str) -> RegistryResult<Option<String>> {
    if let Some(id) = parse_note_id(key) {
        let id_text = id.to_string();
        if note_exists(conn, &id_text)? {
            return Ok(Some(id_text));
        }
    }

    let by_alias = conn
        .query_row("SELECT id FROM notes WHERE alias = ?1;", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(by_alias)
}

fn note_exists(conn: &Connection, id_text: &str) -> RegistryResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [id_text],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// An alias is taken when another note owns it or when it names a live id.
fn alias_taken(conn: &Connection, alias: &str) -> RegistryResult<bool> {
    if let Some(id) = parse_note_id(alias) {
        if note_exists(conn, &id.to_string())? {
            return Ok(true);
        }
    }
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE alias = ?1);",
        [alias],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_note(conn: &Connection, id_text: &str) -> RegistryResult<Note> {
    let (alias, created_at, updated_at, current_revision) = conn
        .query_row(
            "SELECT alias, created_at, updated_at, current_revision
             FROM notes
             WHERE id = ?1;",
            [id_text],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, RevisionIndex>(3)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| RegistryError::NotFound(id_text.to_string()))?;

    let mut stmt = conn.prepare(
        "SELECT idx, content, created_at
         FROM revisions
         WHERE note_id = ?1
         ORDER BY idx ASC;",
    )?;
    let mut rows = stmt.query([id_text])?;
    let mut revisions = Vec::new();
    while let Some(row) = rows.next()? {
        revisions.push(Revision::from_parts(
            row.get::<_, RevisionIndex>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ));
    }

    let id = parse_stored_id(id_text)?;
    let store = RevisionStore::from_revisions(revisions).map_err(|err| {
        RegistryError::InvalidData(format!("note `{id_text}` has invalid history: {err}"))
    })?;
    let metadata = NoteMetadata {
        id,
        alias,
        created_at,
        updated_at,
        current_revision,
    };
    Ok(Note::from_parts(metadata, store)?)
}

fn parse_stored_id(id_text: &str) -> RegistryResult<NoteId> {
    Uuid::parse_str(id_text)
        .map_err(|_| RegistryError::InvalidData(format!("invalid uuid value `{id_text}` in notes.id")))
}

fn table_exists(conn: &Connection, table: &str) -> RegistryResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::SqliteNoteRegistry;
    use crate::model::note::Note;
    use crate::registry::{NoteRegistry, RegistryError};
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteNoteRegistry::try_new(conn).err().unwrap();
        assert!(matches!(err, RegistryError::MissingRequiredTable("notes")));
    }

    #[test]
    fn uppercase_id_key_resolves() {
        let registry = SqliteNoteRegistry::open_in_memory().unwrap();
        let note = Note::new("body", None, 0);
        let key = note.id().to_string().to_uppercase();
        registry.register(note).unwrap();

        assert_eq!(registry.resolve(&key).unwrap().content().unwrap(), "body");
    }

    #[test]
    fn corrupted_history_is_rejected_on_read() {
        let registry = SqliteNoteRegistry::open_in_memory().unwrap();
        registry
            .register(Note::new("v1", Some("gap".to_string()), 0))
            .unwrap();
        registry.append_revision("gap", "v2", 1).unwrap();
        registry.append_revision("gap", "v3", 2).unwrap();

        {
            let conn = registry.lock().unwrap();
            conn.execute("DELETE FROM revisions WHERE idx = 2;", [])
                .unwrap();
        }

        let err = registry.resolve("gap").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidData(_)));
    }
}
