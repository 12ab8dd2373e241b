//! Scheduler error types

use std::time::Duration;

use stellar_core::SyncError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler was shut down and accepts no new tasks
    #[error("Scheduler already stopped")]
    AlreadyStopped,

    /// No tokio runtime available to spawn the task on
    #[error("Failed to start scheduled task: {0}")]
    StartFailed(String),

    /// Interval must be non-zero
    #[error("Invalid interval: {0:?}")]
    InvalidInterval(Duration),

    /// Shutdown did not finish in time
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        InfraError(SyncError::Scheduler(err.to_string()))
    }
}

impl From<SchedulerError> for SyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
