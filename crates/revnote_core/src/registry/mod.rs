//! Note registry contracts and implementations.
//!
//! # Responsibility
//! - Map external keys (note id or alias) to notes.
//! - Enforce id/alias uniqueness and serialize history appends.
//! - Isolate storage details from service orchestration.
//!
//! # Invariants
//! - At most one live note per id and per alias.
//! - An alias never equals another live note's alias or id.
//! - Key resolution checks the id namespace before the alias namespace.
//! - Registries return semantic errors (`NotFound`, `Conflict`) in addition
//!   to storage transport errors.

use crate::db::DbError;
use crate::model::note::{Note, NoteId};
use crate::model::revision::RevisionError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryNoteRegistry;
pub use sqlite::SqliteNoteRegistry;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Which uniqueness rule a registration violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKey {
    Id(NoteId),
    Alias(String),
}

impl Display for ConflictKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id `{id}`"),
            Self::Alias(alias) => write!(f, "alias `{alias}`"),
        }
    }
}

/// Registry error for lookup, registration and append operations.
#[derive(Debug)]
pub enum RegistryError {
    /// Key resolves to neither an id nor an alias.
    NotFound(String),
    Conflict(ConflictKey),
    Revision(RevisionError),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    LockPoisoned(&'static str),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "note not found: {key}"),
            Self::Conflict(key) => write!(f, "note {key} is already registered"),
            Self::Revision(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is not migrated: missing table `{table}`")
            }
            Self::LockPoisoned(context) => write!(f, "registry lock poisoned: {context}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Revision(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RevisionError> for RegistryError {
    fn from(value: RevisionError) -> Self {
        Self::Revision(value)
    }
}

impl From<DbError> for RegistryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Authoritative index from id/alias to note.
///
/// Implementations are shared between concurrent callers, so every method
/// takes `&self` and synchronizes internally.
pub trait NoteRegistry: Send + Sync {
    /// Returns an owned snapshot of the note addressed by `key`.
    fn resolve(&self, key: &str) -> RegistryResult<Note>;
    /// Inserts a new note together with its alias index entry.
    fn register(&self, note: Note) -> RegistryResult<()>;
    /// Removes the note addressed by `key` with its alias and history.
    fn remove(&self, key: &str) -> RegistryResult<Note>;
    /// Appends one revision to the note addressed by `key`.
    ///
    /// Appends to the same note are serialized; the returned snapshot
    /// includes the new revision.
    fn append_revision(&self, key: &str, content: &str, created_at: i64) -> RegistryResult<Note>;
    /// Number of live notes.
    fn len(&self) -> RegistryResult<usize>;

    fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len()? == 0)
    }
}

macro_rules! forward_registry {
    ($wrapper:ident) => {
        impl<R: NoteRegistry + ?Sized> NoteRegistry for $wrapper<R> {
            fn resolve(&self, key: &str) -> RegistryResult<Note> {
                (**self).resolve(key)
            }

            fn register(&self, note: Note) -> RegistryResult<()> {
                (**self).register(note)
            }

            fn remove(&self, key: &str) -> RegistryResult<Note> {
                (**self).remove(key)
            }

            fn append_revision(
                &self,
                key: &str,
                content: &str,
                created_at: i64,
            ) -> RegistryResult<Note> {
                (**self).append_revision(key, content, created_at)
            }

            fn len(&self) -> RegistryResult<usize> {
                (**self).len()
            }
        }
    };
}

// Shared (`Arc`) and type-erased (`Box<dyn _>`) registries.
forward_registry!(Arc);
forward_registry!(Box);

/// Parses `key` into the id namespace, if it is formatted as an id.
pub(crate) fn parse_note_id(key: &str) -> Option<NoteId> {
    Uuid::parse_str(key).ok()
}
