//! # Stellar Core
//!
//! Sync logic between the extension and the memory server - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for HTTP transport, persistence and scheduling
//! - The request executor with 429 backoff
//! - The durable offline queue and its replayer
//! - The connectivity monitor
//! - The [`SyncService`] facade and the command router on top of it
//!
//! ## Architecture Principles
//! - Depends only on `stellar-common` and `stellar-domain`
//! - No HTTP client, filesystem or timer code
//! - All external dependencies via traits

pub mod error;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{SyncError, SyncErrorCategory, SyncResult};
pub use sync::commands::{dispatch, dispatch_raw, ForgetRequest, SyncCommand};
pub use sync::connectivity::{ConnectivityCheck, ConnectivityMonitor};
pub use sync::executor::RequestExecutor;
pub use sync::metrics::{MetricsSnapshot, SyncMetrics};
pub use sync::ports::{
    ConnectivityStore, HttpTransport, QueueStore, ScheduledTask, Scheduler, TaskFuture,
};
pub use sync::queue::{DrainReport, DurableQueue};
pub use sync::replay::QueueReplayer;
pub use sync::request::{ApiRequest, ApiResponse, HttpMethod};
pub use sync::service::{QueueStatus, SyncService, SyncSettings};
