//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Decide where the book file lives and how logging is set up.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - An unparseable log level is an error, never silently ignored.

use crate::logging::{default_log_level, LogLevel, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_PATH_ENV: &str = "CONTACTBOOK_DATA_PATH";
pub const LOG_LEVEL_ENV: &str = "CONTACTBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CONTACTBOOK_LOG_DIR";
pub const DEFAULT_DATA_FILE: &str = "contactbook.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(LoggingError),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(err) => write!(f, "{LOG_LEVEL_ENV}: {err}"),
            Self::RelativeLogDir(dir) => write!(
                f,
                "{LOG_DIR_ENV}: expected an absolute path, got `{}`",
                dir.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            Self::RelativeLogDir(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub log_level: LogLevel,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: std::env::temp_dir().join(DEFAULT_DATA_FILE),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = LogLevel::parse(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DATA_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::{default_log_level, LogLevel};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_level, default_log_level());
        assert!(config.data_path.ends_with("contactbook.sqlite3"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (DATA_PATH_ENV, "/srv/book.sqlite3"),
            (LOG_LEVEL_ENV, "WARN"),
            (LOG_DIR_ENV, "/var/log/contactbook"),
        ]))
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("/srv/book.sqlite3"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/contactbook")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[(DATA_PATH_ENV, "   ")])).unwrap();
        assert_eq!(config.data_path, AppConfig::default().data_path);
    }

    #[test]
    fn bad_level_and_relative_dir_are_errors() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "chatty")])),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "logs")])),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
