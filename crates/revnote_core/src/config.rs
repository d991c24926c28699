//! Core configuration.
//!
//! # Responsibility
//! - Hold service limits, storage selection and logging settings.
//! - Load them from `REVNOTE_*` environment variables.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors.
//! - Forbidden aliases are stored lowercased and deduplicated.

use crate::logging::default_log_level;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_MAX_DOCUMENT_LENGTH: &str = "REVNOTE_MAX_DOCUMENT_LENGTH";
pub const ENV_FORBIDDEN_ALIASES: &str = "REVNOTE_FORBIDDEN_ALIASES";
pub const ENV_DB_PATH: &str = "REVNOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "REVNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "REVNOTE_LOG_DIR";

pub const DEFAULT_MAX_DOCUMENT_LENGTH: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Limits applied by `NoteService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteServiceConfig {
    /// Maximum content length in characters for create/update.
    pub max_document_length: usize,
    /// Aliases that can never be claimed (compared case-insensitively).
    pub forbidden_aliases: BTreeSet<String>,
}

impl Default for NoteServiceConfig {
    fn default() -> Self {
        Self {
            max_document_length: DEFAULT_MAX_DOCUMENT_LENGTH,
            forbidden_aliases: BTreeSet::new(),
        }
    }
}

impl NoteServiceConfig {
    pub fn with_forbidden_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden_aliases = normalize_aliases(aliases);
        self
    }

    pub fn is_forbidden(&self, alias: &str) -> bool {
        self.forbidden_aliases
            .contains(alias.to_ascii_lowercase().as_str())
    }
}

/// Registry backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    #[default]
    InMemory,
    Sqlite(PathBuf),
}

/// File logging settings; `log_dir = None` leaves logging uninitialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreConfig {
    pub service: NoteServiceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(value) = read(ENV_MAX_DOCUMENT_LENGTH) {
            config.service.max_document_length = value
                .parse::<usize>()
                .ok()
                .filter(|max| *max > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_MAX_DOCUMENT_LENGTH,
                    value,
                })?;
        }
        if let Some(value) = read(ENV_FORBIDDEN_ALIASES) {
            config.service.forbidden_aliases = normalize_aliases(value.split(','));
        }
        if let Some(value) = read(ENV_DB_PATH) {
            config.storage = StorageConfig::Sqlite(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.logging.level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            config.logging.log_dir = Some(PathBuf::from(value));
        }

        Ok(config)
    }
}

fn normalize_aliases<I, S>(aliases: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    aliases
        .into_iter()
        .map(|alias| alias.as_ref().trim().to_ascii_lowercase())
        .filter(|alias| !alias.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, NoteServiceConfig, StorageConfig, DEFAULT_MAX_DOCUMENT_LENGTH,
        ENV_MAX_DOCUMENT_LENGTH,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.service.max_document_length, DEFAULT_MAX_DOCUMENT_LENGTH);
        assert!(config.service.forbidden_aliases.is_empty());
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn reads_all_keys() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            ("REVNOTE_MAX_DOCUMENT_LENGTH", "42"),
            ("REVNOTE_FORBIDDEN_ALIASES", " New, notes ,,ME"),
            ("REVNOTE_DB_PATH", "/tmp/notes.db"),
            ("REVNOTE_LOG_LEVEL", "warn"),
            ("REVNOTE_LOG_DIR", "/tmp/logs"),
        ]))
        .unwrap();

        assert_eq!(config.service.max_document_length, 42);
        let forbidden: Vec<_> = config.service.forbidden_aliases.iter().cloned().collect();
        assert_eq!(forbidden, vec!["me", "new", "notes"]);
        assert_eq!(
            config.storage,
            StorageConfig::Sqlite(PathBuf::from("/tmp/notes.db"))
        );
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn rejects_non_numeric_or_zero_length() {
        for bad in ["abc", "0", "-3"] {
            let err = CoreConfig::from_lookup(lookup_from(&[(ENV_MAX_DOCUMENT_LENGTH, bad)]))
                .unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    key: ENV_MAX_DOCUMENT_LENGTH,
                    value: bad.to_string(),
                }
            );
        }
    }

    #[test]
    fn forbidden_check_is_case_insensitive() {
        let config = NoteServiceConfig::default().with_forbidden_aliases(["Admin"]);
        assert!(config.is_forbidden("ADMIN"));
        assert!(!config.is_forbidden("admins"));
    }
}
