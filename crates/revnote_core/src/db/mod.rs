//! SQLite storage bootstrap for the persistent note registry.
//!
//! # Responsibility
//! - Open and configure note database connections.
//! - Apply the note/revision schema migrations in order.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No registry reads or writes happen before migrations succeed.
//! - Every failure names the bootstrap phase it came from.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Note database failure, tagged by bootstrap phase.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused to open the file (`mode` is `file` or `memory`).
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A schema migration failed; the whole batch was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file carries a schema written by a newer binary.
    SchemaAhead { found: u32, supported: u32 },
    /// Any other statement on an open connection.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Stable `error_code` value for `db_open` log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::Migration { .. } => "db_migration_failed",
            Self::SchemaAhead { .. } => "db_schema_ahead",
            Self::Sqlite(_) => "db_sqlite_failed",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} note database: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "note schema migration {version} failed: {source}")
            }
            Self::SchemaAhead { found, supported } => write!(
                f,
                "note database schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaAhead { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
