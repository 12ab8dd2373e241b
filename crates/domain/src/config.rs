//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BACKOFF_BASE_MS, DATA_DIR_NAME, DEFAULT_BASE_URL, HEALTH_CHECK_INTERVAL_SECS,
    HEALTH_TIMEOUT_MS, MAX_BACKOFF_RETRIES, MAX_QUEUE_RETRIES, MAX_STORE_PER_WINDOW,
    RATE_WINDOW_MS, REQUEST_TIMEOUT_MS,
};
use crate::errors::{Result, StellarError};

/// Sync client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
}

/// Memory server endpoint and request timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub health_timeout_ms: u64,
    /// Delay before the first retry after a 429; doubles on every retry
    pub backoff_base_ms: u64,
    pub max_backoff_retries: u32,
}

/// Offline queue and connectivity monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub health_interval_secs: u64,
    /// Failed replays tolerated before an operation is dropped
    pub max_queue_retries: u32,
}

/// Client-side admission for store requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_store_per_window: usize,
    pub window_ms: u64,
}

/// Where persisted records live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            health_timeout_ms: HEALTH_TIMEOUT_MS,
            backoff_base_ms: BACKOFF_BASE_MS,
            max_backoff_retries: MAX_BACKOFF_RETRIES,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            health_interval_secs: HEALTH_CHECK_INTERVAL_SECS,
            max_queue_retries: MAX_QUEUE_RETRIES,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_store_per_window: MAX_STORE_PER_WINDOW, window_ms: RATE_WINDOW_MS }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from(DATA_DIR_NAME) }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl SyncConfig {
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Config {
    /// Reject values that would make the client misbehave silently
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(StellarError::Config("api.base_url must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StellarError::Config(format!(
                "api.base_url must be an http(s) URL, got {url}"
            )));
        }

        let positive = [
            ("api.request_timeout_ms", self.api.request_timeout_ms),
            ("api.health_timeout_ms", self.api.health_timeout_ms),
            ("api.backoff_base_ms", self.api.backoff_base_ms),
            ("sync.health_interval_secs", self.sync.health_interval_secs),
            ("rate_limit.window_ms", self.rate_limit.window_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(StellarError::Config(format!("{field} must be greater than 0")));
            }
        }
        if self.rate_limit.max_store_per_window == 0 {
            return Err(StellarError::Config(
                "rate_limit.max_store_per_window must be greater than 0".into(),
            ));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(StellarError::Config("storage.data_dir must not be empty".into()));
        }
        Ok(())
    }
}
