//! Engine configuration.
//!
//! Configuration is loaded from a YAML file, from the environment, or both:
//! the file provides the base values and `SWITCHSYNC_*` environment
//! variables override individual keys. Device credentials are never read
//! from the file; they come from the environment only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::Credentials;
use crate::error::{ConfigError, Result, SyncError};

/// Default number of queue workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default management-session connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of queue workers.
    pub workers: usize,
    /// Management-session connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Path of the JSON inventory file. `None` selects the in-memory store.
    pub inventory_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            inventory_path: None,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(ConfigError::ParseError {
                message: format!("Failed to read {}: {e}", path.display()),
            })
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            SyncError::Config(ConfigError::ParseError {
                message: format!("YAML parse error in {}: {e}", path.display()),
            })
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the environment, applying overrides on top
    /// of the defaults. A `.env` file in the working directory is read
    /// first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an unparseable value.
    pub fn from_env() -> Result<Self> {
        load_dotenv();

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `SWITCHSYNC_*` environment overrides to this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an unparseable value.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(workers) = std::env::var("SWITCHSYNC_WORKERS") {
            debug!("Overriding workers from environment");
            self.workers = workers.parse().map_err(|_| {
                SyncError::Config(ConfigError::ParseError {
                    message: format!("SWITCHSYNC_WORKERS is not a number: '{workers}'"),
                })
            })?;
        }

        if let Ok(timeout) = std::env::var("SWITCHSYNC_CONNECT_TIMEOUT_SECS") {
            debug!("Overriding connect_timeout_secs from environment");
            self.connect_timeout_secs = timeout.parse().map_err(|_| {
                SyncError::Config(ConfigError::ParseError {
                    message: format!("SWITCHSYNC_CONNECT_TIMEOUT_SECS is not a number: '{timeout}'"),
                })
            })?;
        }

        if let Ok(path) = std::env::var("SWITCHSYNC_INVENTORY_PATH") {
            debug!("Overriding inventory_path from environment");
            self.inventory_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ConfigError::ValidationError {
                message: "workers must be at least 1".into(),
            }
            .into());
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "connect_timeout_secs must be at least 1".into(),
            }
            .into());
        }

        Ok(())
    }

    /// Reads the device credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns a missing-variable error naming the absent variable.
    pub fn credentials() -> Result<Credentials> {
        let username = require_env("SWITCHSYNC_USERNAME")?;
        let password = require_env("SWITCHSYNC_PASSWORD")?;
        Ok(Credentials::new(username, password))
    }
}

/// Loads the `.env` file from the working directory when present.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from: {}", path.display()),
        Err(_) => debug!("No .env file found"),
    }
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        SyncError::Config(ConfigError::MissingEnvVar {
            name: name.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert!(config.inventory_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "workers: 8\nconnect_timeout_secs: 10\ninventory_path: /var/lib/switchsync/inventory.json"
        )
        .expect("write");

        let config = EngineConfig::from_yaml_file(file.path()).expect("load");
        assert_eq!(config.workers, 8);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(
            config.inventory_path,
            Some(PathBuf::from("/var/lib/switchsync/inventory.json"))
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "workers: 2").expect("write");

        let config = EngineConfig::from_yaml_file(file.path()).expect("load");
        assert_eq!(config.workers, 2);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_file_is_typed() {
        let err = EngineConfig::from_yaml_file("/nonexistent/switchsync.yaml")
            .expect_err("must fail");
        assert!(matches!(
            err,
            SyncError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_is_typed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "workers: [not a number").expect("write");

        let err = EngineConfig::from_yaml_file(file.path()).expect_err("must fail");
        assert!(matches!(
            err,
            SyncError::Config(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = EngineConfig {
            workers: 0,
            ..EngineConfig::default()
        };
        let err = config.validate().expect_err("must fail");
        assert!(matches!(
            err,
            SyncError::Config(ConfigError::ValidationError { .. })
        ));
    }
}
