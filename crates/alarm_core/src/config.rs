//! Environment-driven core configuration.
//!
//! # Responsibility
//! - Resolve database location, logging and listing defaults from
//!   `ALARM_*` environment variables.
//! - Open the configured database and start logging from one place.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Malformed values are reported, never silently replaced by defaults.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use crate::repo::alarm_repo::DEFAULT_LIST_LIMIT;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "ALARM_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "ALARM_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "ALARM_LOG_DIR";
pub const LIST_LIMIT_ENV: &str = "ALARM_LIST_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where alarms are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Private in-memory database, discarded on exit.
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database: DatabaseLocation,
    pub log_level: &'static str,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Page size used when callers do not pass a `limit`.
    pub list_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Memory,
            log_level: default_log_level(),
            log_dir: None,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults for
    /// unset or blank keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(DB_PATH_ENV) {
            config.database = DatabaseLocation::File(PathBuf::from(path));
        }

        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                key: LOG_LEVEL_ENV,
                value: level.clone(),
                reason: err.to_string(),
            })?;
        }

        if let Some(dir) = read(LOG_DIR_ENV) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: LOG_DIR_ENV,
                    value: dir.display().to_string(),
                    reason: "must be an absolute path".to_string(),
                });
            }
            config.log_dir = Some(dir);
        }

        if let Some(limit) = read(LIST_LIMIT_ENV) {
            config.list_limit = match limit.parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: LIST_LIMIT_ENV,
                        value: limit,
                        reason: "must be a positive integer".to_string(),
                    })
                }
            };
        }

        Ok(config)
    }

    /// Opens and migrates the configured database.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseLocation::Memory => open_db_in_memory(),
            DatabaseLocation::File(path) => open_db(path),
        }
    }

    /// Starts file logging when `log_dir` is set.
    ///
    /// Returns whether a file logger is active afterwards.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(self.log_level, log_dir)?;
        info!(
            "event=config_loaded module=config status=ok database={} list_limit={}",
            match self.database {
                DatabaseLocation::Memory => "memory",
                DatabaseLocation::File(_) => "file",
            },
            self.list_limit
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, DatabaseLocation, DB_PATH_ENV, LIST_LIMIT_ENV, LOG_DIR_ENV,
        LOG_LEVEL_ENV,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn resolve(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(resolve(&[]).unwrap(), CoreConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = resolve(&[
            (DB_PATH_ENV, " /var/lib/alarms.db "),
            (LOG_LEVEL_ENV, "Warning"),
            (LOG_DIR_ENV, "/var/log/alarms"),
            (LIST_LIMIT_ENV, "25"),
        ])
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/var/lib/alarms.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/alarms")));
        assert_eq!(config.list_limit, 25);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = resolve(&[(DB_PATH_ENV, "   "), (LOG_DIR_ENV, "")]).unwrap();
        assert_eq!(config.database, DatabaseLocation::Memory);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            (LOG_LEVEL_ENV, "loud"),
            (LOG_DIR_ENV, "relative/logs"),
            (LIST_LIMIT_ENV, "0"),
            (LIST_LIMIT_ENV, "-4"),
        ] {
            let err = resolve(&[(key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key: got, .. } if *got == key),
                "{key}={value} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn init_logging_without_dir_is_a_no_op() {
        assert!(!CoreConfig::default().init_logging().unwrap());
    }
}
