use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::default_database_path;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub version: String,
    /// Falls back to the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Off by default: the store never changes a status on its own unless
    /// the caller asks for it.
    #[serde(default)]
    pub recover_interrupted_on_open: bool,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_event_capacity() -> usize {
    256
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            recover_interrupted_on_open: false,
            event_capacity: default_event_capacity(),
        }
    }
}

impl StoreConfig {
    /// Default configuration pointing at an explicit database file.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// The configured database path, or the platform default.
    pub fn resolved_database_path(&self) -> Result<PathBuf, ConfigError> {
        self.database_path
            .clone()
            .or_else(default_database_path)
            .ok_or_else(|| ConfigError::Validation {
                message: "No databasePath configured and no platform data directory available"
                    .to_string(),
            })
    }
}
