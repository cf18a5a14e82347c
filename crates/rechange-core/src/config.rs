//! Configuration for logging, history and composite failure handling

use crate::composite::FailurePolicy;
use crate::error::{ChangeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log levels accepted by [`LoggingConfig::level`]
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeConfig {
    /// Logging setup
    pub logging: LoggingConfig,
    /// Undo/redo history setup
    pub history: HistoryConfig,
    /// How composites react when a child fails
    pub failure_policy: FailurePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
    /// Include targets and line numbers
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

/// History configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undoable entries kept
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig { limit: 100 }
    }
}

/// Loads [`ChangeConfig`] from YAML or JSON files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub fn load_from_yaml(path: &Path) -> Result<ChangeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChangeError::config(format!("Failed to read config file: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ChangeError::config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from a JSON file
    pub fn load_from_json(path: &Path) -> Result<ChangeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChangeError::config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ChangeError::config(format!("Failed to parse JSON: {}", e)))
    }

    /// Load and validate configuration, picking the format from the extension
    pub fn load(path: &Path) -> Result<ChangeConfig> {
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path)?,
            Some("json") => Self::load_from_json(path)?,
            _ => {
                return Err(ChangeError::config(format!(
                    "Unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate `config` and write it to `path`, picking the format from the extension
    pub fn save(config: &ChangeConfig, path: &Path) -> Result<()> {
        Self::validate(config)?;
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(config)?,
            Some("json") => serde_json::to_string_pretty(config)?,
            _ => {
                return Err(ChangeError::config(format!(
                    "Unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(config: &ChangeConfig) -> Result<()> {
        if config.history.limit == 0 {
            return Err(ChangeError::config("history limit must be at least 1"));
        }

        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ChangeError::config(format!(
                "Unknown log level: {}",
                config.logging.level
            )));
        }

        Ok(())
    }
}
