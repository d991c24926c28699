//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/delete and revision APIs over a registry.
//! - Validate aliases and content length before touching storage.
//! - Map registry failures to use-case level errors.
//!
//! # Invariants
//! - Every content change appends exactly one revision.
//! - Lookups (`get_note_by_id_or_alias`) report a miss as `None`; mutations
//!   report it as `NoteNotFound`.
//! - Content bodies are never written to logs, only their lengths.

use crate::config::NoteServiceConfig;
use crate::model::note::{now_epoch_ms, validate_alias, AliasValidationError, Note};
use crate::model::revision::{Revision, RevisionError, RevisionIndex};
use crate::registry::{ConflictKey, NoteRegistry, RegistryError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Key resolves to no live note.
    NoteNotFound(String),
    RevisionNotFound {
        key: String,
        index: RevisionIndex,
    },
    /// Alias already registered.
    AliasConflict(String),
    InvalidAlias(AliasValidationError),
    ForbiddenAlias(String),
    DocumentTooLong {
        length: usize,
        max: usize,
    },
    /// Storage-layer failure.
    Registry(RegistryError),
    /// Internal consistency violation, e.g. a note without revisions.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(key) => write!(f, "note not found: {key}"),
            Self::RevisionNotFound { key, index } => {
                write!(f, "revision {index} of note `{key}` not found")
            }
            Self::AliasConflict(alias) => write!(f, "alias `{alias}` is already in use"),
            Self::InvalidAlias(err) => write!(f, "{err}"),
            Self::ForbiddenAlias(alias) => write!(f, "alias `{alias}` is forbidden"),
            Self::DocumentTooLong { length, max } => write!(
                f,
                "document is {length} characters long, maximum is {max}"
            ),
            Self::Registry(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAlias(err) => Some(err),
            Self::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for NoteServiceError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound(key) => Self::NoteNotFound(key),
            RegistryError::Conflict(ConflictKey::Alias(alias)) => Self::AliasConflict(alias),
            RegistryError::Revision(RevisionError::EmptyStore) => {
                Self::InconsistentState("note has no revisions")
            }
            other => Self::Registry(other),
        }
    }
}

impl From<AliasValidationError> for NoteServiceError {
    fn from(value: AliasValidationError) -> Self {
        Self::InvalidAlias(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over an injected registry.
pub struct NoteService<R: NoteRegistry> {
    registry: R,
    config: NoteServiceConfig,
}

impl<R: NoteRegistry> NoteService<R> {
    /// Creates a service with default limits.
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, NoteServiceConfig::default())
    }

    pub fn with_config(registry: R, config: NoteServiceConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &NoteServiceConfig {
        &self.config
    }

    /// Creates a note whose first revision holds `content`.
    ///
    /// # Errors
    /// - `InvalidAlias`/`ForbiddenAlias` when `alias` breaks alias rules.
    /// - `AliasConflict` when `alias` is already taken.
    /// - `DocumentTooLong` when `content` exceeds the configured maximum.
    pub fn create_note(
        &self,
        content: impl Into<String>,
        alias: Option<&str>,
    ) -> NoteServiceResult<Note> {
        let content = content.into();
        let length = self.check_length(&content)?;
        if let Some(alias) = alias {
            self.check_alias(alias)?;
        }

        let note = Note::new(content, alias.map(str::to_string), now_epoch_ms());
        let snapshot = note.clone();
        if let Err(err) = self.registry.register(note) {
            warn!(
                "event=note_create module=service status=error has_alias={} error={}",
                alias.is_some(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=note_create module=service status=ok note_id={} has_alias={} length={}",
            snapshot.id(),
            alias.is_some(),
            length
        );
        Ok(snapshot)
    }

    /// Looks a note up by id (first) or alias; `None` on miss.
    pub fn get_note_by_id_or_alias(&self, key: &str) -> NoteServiceResult<Option<Note>> {
        match self.registry.resolve(key) {
            Ok(note) => Ok(Some(note)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Appends `content` as the newest revision of the addressed note.
    ///
    /// # Errors
    /// - `NoteNotFound` when `key` resolves to no note, checked before length.
    /// - `DocumentTooLong` when `content` exceeds the configured maximum.
    pub fn update_note(&self, key: &str, content: impl Into<String>) -> NoteServiceResult<Note> {
        let content = content.into();
        match self.append_checked(key, &content) {
            Ok((note, length)) => {
                info!(
                    "event=note_update module=service status=ok note_id={} revision={} length={}",
                    note.id(),
                    note.metadata().current_revision,
                    length
                );
                Ok(note)
            }
            Err(err) => {
                warn!("event=note_update module=service status=error error={err}");
                Err(err)
            }
        }
    }

    /// Removes the addressed note and its whole history; frees its alias.
    pub fn delete_note(&self, key: &str) -> NoteServiceResult<()> {
        let removed = match self.registry.remove(key) {
            Ok(removed) => removed,
            Err(err) => {
                warn!("event=note_delete module=service status=error error={err}");
                return Err(err.into());
            }
        };
        info!(
            "event=note_delete module=service status=ok note_id={} revisions={}",
            removed.id(),
            removed.revisions().count()
        );
        Ok(())
    }

    /// Returns every revision in creation order.
    pub fn get_revisions(&self, key: &str) -> NoteServiceResult<Vec<Revision>> {
        let note = self.registry.resolve(key)?;
        Ok(note.revisions().iter().cloned().collect())
    }

    /// Returns one revision by its 1-based index.
    pub fn get_revision(&self, key: &str, index: RevisionIndex) -> NoteServiceResult<Revision> {
        let note = self.registry.resolve(key)?;
        note.revisions()
            .get(index)
            .cloned()
            .map_err(|_| NoteServiceError::RevisionNotFound {
                key: key.to_string(),
                index,
            })
    }

    /// Returns the latest content of the addressed note.
    pub fn get_content(&self, key: &str) -> NoteServiceResult<String> {
        let note = self.registry.resolve(key)?;
        match note.content() {
            Ok(content) => Ok(content.to_string()),
            Err(err) => {
                error!(
                    "event=note_content module=service status=error note_id={} error={}",
                    note.id(),
                    err
                );
                Err(NoteServiceError::InconsistentState("note has no revisions"))
            }
        }
    }

    fn append_checked(&self, key: &str, content: &str) -> NoteServiceResult<(Note, usize)> {
        self.registry.resolve(key)?;
        let length = self.check_length(content)?;
        let note = self
            .registry
            .append_revision(key, content, now_epoch_ms())?;
        Ok((note, length))
    }

    /// Returns the content length in characters when within the limit.
    fn check_length(&self, content: &str) -> NoteServiceResult<usize> {
        let length = content.chars().count();
        let max = self.config.max_document_length;
        if length > max {
            return Err(NoteServiceError::DocumentTooLong { length, max });
        }
        Ok(length)
    }

    fn check_alias(&self, alias: &str) -> NoteServiceResult<()> {
        validate_alias(alias)?;
        if self.config.is_forbidden(alias) {
            return Err(NoteServiceError::ForbiddenAlias(alias.to_string()));
        }
        Ok(())
    }
}
