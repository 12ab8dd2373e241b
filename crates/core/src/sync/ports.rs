//! Port interfaces for sync operations

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stellar_domain::PendingOperation;

use super::request::{ApiRequest, ApiResponse};
use crate::error::SyncResult;

/// Trait for sending a single HTTP request to the memory server
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status, and an error only when no response was obtainable.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request once, honouring its timeout
    async fn send(&self, request: &ApiRequest) -> SyncResult<ApiResponse>;
}

/// Trait for persisting the offline queue as a single record
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load the whole queue; an absent record is an empty queue
    async fn load(&self) -> SyncResult<Vec<PendingOperation>>;

    /// Replace the whole queue
    async fn save(&self, operations: &[PendingOperation]) -> SyncResult<()>;
}

/// Trait for persisting the last observed connectivity flag
#[async_trait]
pub trait ConnectivityStore: Send + Sync {
    /// `None` when no probe result was ever stored
    async fn load(&self) -> SyncResult<Option<bool>>;

    /// Record the result of the latest probe, overwriting the previous one
    async fn save(&self, connected: bool) -> SyncResult<()>;
}

/// Future produced by one run of a scheduled task
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Repeating task registered on a [`Scheduler`]
pub type ScheduledTask = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Trait for running a task periodically
pub trait Scheduler: Send + Sync {
    /// Run `task` every `interval`, starting one interval from now
    fn schedule(&self, interval: Duration, task: ScheduledTask) -> SyncResult<()>;
}
