//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default number of recent turns carried into a new conversation.
pub const DEFAULT_MESSAGE_COUNT: usize = 8;
/// Smallest accepted message window.
pub const MIN_MESSAGE_COUNT: usize = 2;
/// Largest accepted message window.
pub const MAX_MESSAGE_COUNT: usize = 50;

/// Paths to LiteChat data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Persisted key-value store (`data/storage.json`).
    pub storage_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            storage_file: root.join("storage.json"),
            root,
        })
    }
}

/// Top-level LiteChat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteConfig {
    /// Fallback message window when no setting is persisted.
    pub message_count: usize,
    /// How long to wait for the input surface of a fresh conversation.
    pub wait_timeout_ms: u64,
    /// Delay between element lookups while waiting.
    pub poll_interval_ms: u64,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl LiteConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let message_count = std::env::var("LITECHAT_MESSAGE_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MESSAGE_COUNT);
        let wait_timeout_ms = std::env::var("LITECHAT_WAIT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15_000);
        let poll_interval_ms = std::env::var("LITECHAT_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let config = Self {
            message_count: validate_message_count(message_count)?,
            wait_timeout_ms,
            poll_interval_ms: poll_interval_ms.max(1),
            data_paths: DataPaths::new(data_dir)?,
        };
        Ok(config)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Check that a message window lies in the accepted range.
pub fn validate_message_count(count: usize) -> Result<usize> {
    if (MIN_MESSAGE_COUNT..=MAX_MESSAGE_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(Error::Config(format!(
            "message count must be between {} and {}, got {}",
            MIN_MESSAGE_COUNT, MAX_MESSAGE_COUNT, count
        )))
    }
}
