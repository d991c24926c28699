//! Core domain logic for revnote.
//! Notes, their append-only revision history, and the registry that maps
//! ids and aliases to them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;

pub use config::{ConfigError, CoreConfig, LoggingConfig, NoteServiceConfig, StorageConfig};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status, LoggingError};
pub use model::note::{validate_alias, AliasValidationError, Note, NoteId, NoteMetadata};
pub use model::revision::{Revision, RevisionError, RevisionIndex, RevisionStore};
pub use registry::{
    ConflictKey, InMemoryNoteRegistry, NoteRegistry, RegistryError, RegistryResult,
    SqliteNoteRegistry,
};
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};

/// Minimal health-check API for smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the registry selected by `storage`.
pub fn open_registry(storage: &StorageConfig) -> RegistryResult<Box<dyn NoteRegistry>> {
    match storage {
        StorageConfig::InMemory => Ok(Box::new(InMemoryNoteRegistry::new())),
        StorageConfig::Sqlite(path) => Ok(Box::new(SqliteNoteRegistry::open(path)?)),
    }
}
