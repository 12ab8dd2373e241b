//! # Stellar Infrastructure
//!
//! Infrastructure implementations of the `stellar-core` ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - JSON file stores for the offline queue and connectivity flag
//! - The tokio interval scheduler driving the connectivity monitor
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `stellar-core`
//! - Contains all "impure" code (network, filesystem, timers)

pub mod config;
pub mod errors;
pub mod http;
pub mod scheduling;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use scheduling::{IntervalScheduler, SchedulerError, SchedulerResult};
pub use storage::{FileConnectivityStore, FileQueueStore, JsonFileStore};
