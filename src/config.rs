//! Pipeline configuration.
//!
//! One immutable struct constructed per invocation, optionally overridden
//! from a TOML file. Per-source constants (rule tables, endpoints) live in
//! the source descriptors, not here.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Identifying user agent sent with every request.
pub const USER_AGENT: &str = "Compilatio/1.0 (Academic manuscript research; IIIF aggregator)";

/// Runtime settings shared by every importer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Directory for discovery caches and checkpoint files.
    pub cache_dir: PathBuf,
    pub user_agent: String,
    /// HTTP timeout per request, seconds.
    pub timeout_secs: u64,
    /// Retry attempts for a failed fetch.
    pub retries: u32,
    /// Base backoff between retries, milliseconds (grows linearly).
    pub retry_backoff_ms: u64,
    /// Politeness delay enforced after every request, milliseconds.
    pub request_delay_ms: u64,
    /// Item cap applied in `--test` mode.
    pub test_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("database/compilatio.db"),
            cache_dir: PathBuf::from("data"),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: 30,
            retries: 3,
            retry_backoff_ms: 1000,
            request_delay_ms: 300,
            test_limit: 5,
        }
    }
}

impl ImportConfig {
    /// Load settings, applying TOML overrides from `path` when given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let data = fs::read_to_string(path)?;
                Ok(toml::from_str(&data)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Discovery-cache path for a source: `<cache_dir>/<source>_discovery.json`.
    pub fn discovery_cache_path(&self, source_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{source_id}_discovery.json"))
    }

    /// Checkpoint path for a source: `<cache_dir>/<source>_progress.json`.
    pub fn checkpoint_path(&self, source_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{source_id}_progress.json"))
    }
}
