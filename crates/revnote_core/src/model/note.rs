//! Note entity model.
//!
//! # Responsibility
//! - Aggregate note identity (id + optional alias), metadata and history.
//! - Validate user-chosen aliases before they reach a registry.
//!
//! # Invariants
//! - `id` is system-generated and never reused for another note.
//! - A note always holds at least one revision.
//! - `metadata.current_revision` equals the latest revision index.
//! - `metadata.updated_at` equals the latest revision timestamp.

use crate::model::revision::{Revision, RevisionError, RevisionIndex, RevisionStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

static ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.~-]*$").expect("valid alias regex"));

/// Stable system-generated note identifier.
pub type NoteId = Uuid;

/// Alias validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasValidationError {
    Empty,
    SurroundingWhitespace(String),
    InvalidCharacters(String),
    /// Alias parses as a note id and would be shadowed by id lookup.
    LooksLikeId(String),
}

impl Display for AliasValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "alias cannot be empty"),
            Self::SurroundingWhitespace(alias) => {
                write!(f, "alias `{alias}` has leading or trailing whitespace")
            }
            Self::InvalidCharacters(alias) => write!(
                f,
                "alias `{alias}` must start with a letter or digit and contain only letters, digits, `_`, `.`, `~` or `-`"
            ),
            Self::LooksLikeId(alias) => write!(f, "alias `{alias}` is formatted like a note id"),
        }
    }
}

impl Error for AliasValidationError {}

/// Checks the syntactic alias rules shared by every registry.
pub fn validate_alias(alias: &str) -> Result<(), AliasValidationError> {
    if alias.is_empty() {
        return Err(AliasValidationError::Empty);
    }
    if alias.trim() != alias {
        return Err(AliasValidationError::SurroundingWhitespace(alias.to_string()));
    }
    if !ALIAS_RE.is_match(alias) {
        return Err(AliasValidationError::InvalidCharacters(alias.to_string()));
    }
    if Uuid::parse_str(alias).is_ok() {
        return Err(AliasValidationError::LooksLikeId(alias.to_string()));
    }
    Ok(())
}

/// Note metadata record, owned exclusively by its note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub id: NoteId,
    pub alias: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the latest revision.
    pub updated_at: i64,
    pub current_revision: RevisionIndex,
}

/// Note aggregate: identity, metadata and append-only revision history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    metadata: NoteMetadata,
    revisions: RevisionStore,
}

impl Note {
    /// Creates a note with a generated id and `content` as revision 1.
    pub fn new(content: impl Into<String>, alias: Option<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), content, alias, created_at)
    }

    /// Creates a note with a caller-provided id.
    ///
    /// Used by tests and import paths where identity already exists.
    pub fn with_id(
        id: NoteId,
        content: impl Into<String>,
        alias: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            metadata: NoteMetadata {
                id,
                alias,
                created_at,
                updated_at: created_at,
                current_revision: 1,
            },
            revisions: RevisionStore::with_initial(content, created_at),
        }
    }

    /// Reassembles a note from persisted parts.
    ///
    /// `current_revision` and `updated_at` are re-derived from the history so
    /// a stale metadata row cannot disagree with the revisions.
    pub fn from_parts(
        mut metadata: NoteMetadata,
        revisions: RevisionStore,
    ) -> Result<Self, RevisionError> {
        let latest = revisions.latest()?;
        metadata.current_revision = latest.index();
        metadata.updated_at = latest.created_at();
        Ok(Self {
            metadata,
            revisions,
        })
    }

    pub fn id(&self) -> NoteId {
        self.metadata.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.metadata.alias.as_deref()
    }

    pub fn metadata(&self) -> &NoteMetadata {
        &self.metadata
    }

    pub fn revisions(&self) -> &RevisionStore {
        &self.revisions
    }

    /// Content of the latest revision.
    pub fn content(&self) -> Result<&str, RevisionError> {
        self.revisions.latest().map(Revision::content)
    }

    /// Appends one revision and advances the metadata pointer.
    ///
    /// Metadata is untouched when the append fails.
    pub fn append_revision(
        &mut self,
        content: impl Into<String>,
        created_at: i64,
    ) -> Result<&Revision, RevisionError> {
        let revision = self.revisions.append(content, created_at)?;
        self.metadata.current_revision = revision.index();
        self.metadata.updated_at = revision.created_at();
        Ok(revision)
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
