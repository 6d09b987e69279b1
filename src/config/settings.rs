//! Application settings loaded from `ledger.toml` and the environment.
//!
//! Every field has a default, so a missing file yields a working configuration backed by a local
//! `SQLite` database. `DATABASE_URL` in the environment overrides the configured URL.

use crate::core::retry::RetryPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "ledger.toml";

/// Default database used when neither the settings file nor `DATABASE_URL` name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ledger.sqlite?mode=rwc";

/// Top-level settings file structure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Database connection settings
    pub database: DatabaseSettings,
    /// Retry behaviour for transient concurrency failures
    pub retry: RetrySettings,
}

/// `[database]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL understood by `SeaORM`
    pub url: String,
    /// Upper bound on pooled connections (forced to 1 for in-memory databases)
    pub max_connections: u32,
    /// How long to wait for a pooled connection before reporting a conflict
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 4,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl DatabaseSettings {
    /// Pool acquire timeout as a [`Duration`].
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    /// Wall-clock budget for a single attempt
    pub attempt_timeout_ms: u64,
    /// Pause between attempts
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            attempt_timeout_ms: u64::try_from(policy.attempt_timeout.as_millis())
                .unwrap_or(u64::MAX),
            backoff_ms: u64::try_from(policy.backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl Settings {
    /// Builds the retry policy described by the `[retry]` section.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            attempt_timeout: Duration::from_millis(self.retry.attempt_timeout_ms),
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }

    fn validate(self) -> Result<Self> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config {
                message: "database.max_connections must be at least 1".to_string(),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(Error::Config {
                message: "database.url cannot be empty".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value is out of range.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;
    settings.validate()
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Resolves the effective settings for the binary.
///
/// An explicit path must exist. Without one, `ledger.toml` is used when present and defaults
/// otherwise. `DATABASE_URL` always wins over the configured URL.
///
/// # Errors
/// Returns an error if an explicit or discovered settings file cannot be loaded.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings> {
    let mut settings = match explicit {
        Some(path) => load_settings(path)?,
        None if Path::new(DEFAULT_SETTINGS_PATH).exists() => load_settings(DEFAULT_SETTINGS_PATH)?,
        None => {
            tracing::info!("No settings file found, using defaults.");
            Settings::default()
        }
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        tracing::debug!("DATABASE_URL overrides configured database url");
        settings.database.url = url;
    }

    settings.validate()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [database]
            url = "sqlite://ledger-test.sqlite?mode=rwc"
            max_connections = 8
            acquire_timeout_ms = 250

            [retry]
            max_attempts = 3
            attempt_timeout_ms = 1000
            backoff_ms = 5
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.database.url, "sqlite://ledger-test.sqlite?mode=rwc");
        assert_eq!(settings.database.max_connections, 8);
        assert_eq!(settings.database.acquire_timeout(), Duration::from_millis(250));

        let policy = settings.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(1));
        assert_eq!(policy.backoff, Duration::from_millis(5));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings = parse_settings("[retry]\nmax_attempts = 5\n").unwrap();
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.backoff_ms, RetrySettings::default().backoff_ms);
        assert_eq!(settings.database, DatabaseSettings::default());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = parse_settings("[retry]\nmax_attempts = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = parse_settings("[database\nurl = 3");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nmax_connections = 2").unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.database.max_connections, 2);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let result = load_settings("/nonexistent/ledger.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
