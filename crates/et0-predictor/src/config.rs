use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the prediction service.
///
/// Every field is optional in the YAML file:
///
/// ```yaml
/// database: /var/lib/et0/station.db
/// model: /etc/et0/model.json
/// wake_offset_secs: 5
/// operation_timeout_secs: 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database holding `readings` and `predictions`
    pub database: PathBuf,
    /// JSON model artifact
    pub model: PathBuf,
    /// Seconds past the hour boundary at which a cycle starts, giving
    /// ingestion time to land the last readings of the hour
    pub wake_offset_secs: u64,
    /// Upper bound for any single storage operation
    pub operation_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".et0")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: data_dir().join("station.db"),
            model: data_dir().join("model.json"),
            wake_offset_secs: 5,
            operation_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wake_offset_secs >= 3600 {
            return Err(ConfigError::Invalid(format!(
                "wake_offset_secs must be below 3600, got {}",
                self.wake_offset_secs
            )));
        }
        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "operation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wake_offset(&self) -> Duration {
        Duration::from_secs(self.wake_offset_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
