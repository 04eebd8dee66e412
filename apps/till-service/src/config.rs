//! # Service Configuration
//!
//! Loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TILL_*`, e.g. `TILL_DATABASE_PATH`)
//! 2. Config file (`till.toml` in the working directory, optional)
//! 3. Defaults (this file)
//!
//! The default database path lives in the platform data directory:
//! - **macOS**: `~/Library/Application Support/com.till.pos/till.db`
//! - **Windows**: `%APPDATA%\till\pos\data\till.db`
//! - **Linux**: `~/.local/share/pos/till.db`

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use till_db::DbConfig;

/// Config file looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "till.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TILL";

const MAX_STORAGE_TIMEOUT_MS: u64 = 60_000;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Maximum pooled connections.
    /// Default: 5
    pub max_connections: u32,

    /// Upper bound for one storage operation, in milliseconds.
    /// Default: 5000
    pub storage_timeout_ms: u64,
}

impl ServiceConfig {
    /// Loads configuration from `till.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads configuration using `file` as the optional config file.
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let default_path = default_database_path()?;

        let raw = config::Config::builder()
            .set_default("database_path", default_path.to_string_lossy().into_owned())?
            .set_default("max_connections", 5)?
            .set_default("storage_timeout_ms", 5_000)?
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ServiceConfig = raw.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the database layer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                reason: "must not be empty".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.storage_timeout_ms == 0 || self.storage_timeout_ms > MAX_STORAGE_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue {
                key: "storage_timeout_ms",
                reason: format!("must be between 1 and {}", MAX_STORAGE_TIMEOUT_MS),
            });
        }

        Ok(())
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    /// Database configuration derived from this service configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .storage_timeout(self.storage_timeout())
    }
}

/// Platform data directory path for `till.db`.
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "till", "pos").ok_or(ConfigError::NoDataDirectory)?;
    Ok(dirs.data_dir().join("till.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Could not determine app data directory")]
    NoDataDirectory,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("till.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "database_path = \"/srv/till/ledger.db\"").unwrap();
        writeln!(file, "storage_timeout_ms = 750").unwrap();

        let config = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/till/ledger.db"));
        assert_eq!(config.storage_timeout(), Duration::from_millis(750));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.database_path.ends_with("till.db"));
        assert_eq!(config.storage_timeout_ms, 5_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("till.toml");
        std::fs::write(&path, "max_connections = 0\n").unwrap();

        let err = ServiceConfig::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "max_connections",
                ..
            }
        ));

        std::fs::write(&path, "storage_timeout_ms = \"soon\"\n").unwrap();
        assert!(matches!(
            ServiceConfig::load_from(&path).unwrap_err(),
            ConfigError::Load(_)
        ));
    }
}
