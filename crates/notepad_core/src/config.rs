//! Store and logging configuration.
//!
//! # Responsibility
//! - Provide defaults for every tunable.
//! - Read overrides from `NOTEPAD_*` environment variables.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are errors.

use crate::logging::default_log_level;
use crate::service::defaults::{DefaultPolicy, DEFAULT_TITLE_BUDGET, DEFAULT_UNTITLED_TITLE};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "NOTEPAD_DB_PATH";
pub const UNTITLED_TITLE_VAR: &str = "NOTEPAD_UNTITLED_TITLE";
pub const TITLE_BUDGET_VAR: &str = "NOTEPAD_TITLE_BUDGET";
pub const LOG_LEVEL_VAR: &str = "NOTEPAD_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "NOTEPAD_LOG_DIR";

/// Value of [`DB_PATH_VAR`] selecting an in-memory database.
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug)]
pub enum ConfigError {
    /// Variable is set but blank.
    Empty { var: &'static str },
    /// Variable must be a positive integer.
    InvalidNumber { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { var } => write!(f, "`{var}` is set but empty"),
            Self::InvalidNumber { var, value } => {
                write!(f, "`{var}` must be a positive integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

/// Settings needed to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: DatabaseLocation,
    /// Title for notes created with neither title nor body.
    pub untitled_title: String,
    pub title_budget_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Memory,
            untitled_title: DEFAULT_UNTITLED_TITLE.to_string(),
            title_budget_chars: DEFAULT_TITLE_BUDGET,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from `lookup`, which returns the value of a variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = non_empty(&lookup, DB_PATH_VAR)? {
            config.database = if path == MEMORY_DATABASE {
                DatabaseLocation::Memory
            } else {
                DatabaseLocation::File(PathBuf::from(path))
            };
        }
        if let Some(title) = non_empty(&lookup, UNTITLED_TITLE_VAR)? {
            config.untitled_title = title;
        }
        if let Some(raw) = non_empty(&lookup, TITLE_BUDGET_VAR)? {
            config.title_budget_chars = raw
                .parse::<usize>()
                .ok()
                .filter(|budget| *budget > 0)
                .ok_or(ConfigError::InvalidNumber {
                    var: TITLE_BUDGET_VAR,
                    value: raw,
                })?;
        }
        Ok(config)
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        DefaultPolicy {
            untitled_title: self.untitled_title.clone(),
            title_budget_chars: self.title_budget_chars,
        }
    }
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Returns `Ok(None)` when no log directory is configured.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(log_dir) = non_empty(&lookup, LOG_DIR_VAR)? else {
            return Ok(None);
        };
        let level =
            non_empty(&lookup, LOG_LEVEL_VAR)?.unwrap_or_else(|| default_log_level().to_string());
        Ok(Some(Self::new(level, log_dir)))
    }
}

fn non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<String>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { var }),
        Some(value) => Ok(Some(value.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, DatabaseLocation, LogConfig, StoreConfig, DB_PATH_VAR, LOG_DIR_VAR,
        LOG_LEVEL_VAR, TITLE_BUDGET_VAR, UNTITLED_TITLE_VAR,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.default_policy().title_budget_chars, 30);
        assert!(LogConfig::from_lookup(lookup(&[])).unwrap().is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/notes.db"),
            (UNTITLED_TITLE_VAR, "Sans titre"),
            (TITLE_BUDGET_VAR, "12"),
        ]))
        .unwrap();
        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/tmp/notes.db"))
        );
        assert_eq!(config.default_policy().untitled_title, "Sans titre");
        assert_eq!(config.title_budget_chars, 12);

        let memory = StoreConfig::from_lookup(lookup(&[(DB_PATH_VAR, ":memory:")])).unwrap();
        assert_eq!(memory.database, DatabaseLocation::Memory);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[(TITLE_BUDGET_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
        let err = StoreConfig::from_lookup(lookup(&[(UNTITLED_TITLE_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { var } if var == UNTITLED_TITLE_VAR));
    }

    #[test]
    fn log_config_reads_level_and_dir() {
        let config = LogConfig::from_lookup(lookup(&[
            (LOG_DIR_VAR, "/var/log/notepad"),
            (LOG_LEVEL_VAR, "warn"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/notepad"));
    }
}
