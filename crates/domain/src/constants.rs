//! Domain constants
//!
//! Defaults for the sync client. Every timing value here can be overridden
//! through [`crate::Config`].

// Server
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";
pub const HEALTH_PATH: &str = "/api/v1/health";
pub const STORE_PATH: &str = "/api/v1/store";
pub const RECALL_PATH: &str = "/api/v1/recall";
pub const FORGET_PATH: &str = "/api/v1/forget";
pub const STATS_PATH: &str = "/api/v1/stats";

// Request timing
pub const HEALTH_TIMEOUT_MS: u64 = 3_000;
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const BACKOFF_BASE_MS: u64 = 1_000;
pub const MAX_BACKOFF_RETRIES: u32 = 3;

// Client-side store admission
pub const MAX_STORE_PER_WINDOW: usize = 2;
pub const RATE_WINDOW_MS: u64 = 1_000;

// Offline queue
pub const QUEUE_STORAGE_KEY: &str = "stellar_offline_queue";
pub const CONNECTIVITY_STORAGE_KEY: &str = "stellar_connectivity";
pub const MAX_QUEUE_RETRIES: u32 = 3;

// Connectivity monitor
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

// Default data directory name under the user's local data dir
pub const DATA_DIR_NAME: &str = "stellar-sync";
