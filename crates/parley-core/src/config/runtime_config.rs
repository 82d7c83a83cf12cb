use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Backoff applied between reconnect attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_ms: u64,
    pub max_ms: u64,
    /// Give up after this many consecutive failures. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_ms: defaults::DEFAULT_RECONNECT_BASE_MS,
            max_ms: defaults::DEFAULT_RECONNECT_MAX_MS,
            max_attempts: None,
        }
    }
}

/// Which persistence backend holds contacts and session summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory; each identity gets its own subdirectory.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: PathBuf::from(defaults::DEFAULT_DATA_DIR),
        }
    }
}

/// Logging subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub log_level: String,
    /// Output format: "text" or "json".
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            log_format: defaults::DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

/// One configured agent account; becomes one identity at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccountConfig {
    /// Local identity id.
    pub id: String,
    /// Network address bound to this identity.
    pub aid: String,
    /// Agent display name, also used as a mention keyword.
    pub name: String,
    /// Extra names the agent answers to in groups.
    pub aliases: Vec<String>,
}
