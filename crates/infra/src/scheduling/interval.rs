//! Interval scheduler for the connectivity monitor.
//!
//! Every registered task gets its own background loop that waits one full
//! interval before the first run, then runs the task to completion once per
//! tick. A run that overruns the interval delays the next tick instead of
//! bursting. [`IntervalScheduler::shutdown`] cancels all loops and awaits
//! them.

use std::time::Duration;

use parking_lot::Mutex;
use stellar_core::{ScheduledTask, Scheduler, SyncResult};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Tokio-backed [`Scheduler`]
pub struct IntervalScheduler {
    cancellation_token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self { cancellation_token: CancellationToken::new(), handles: Mutex::new(Vec::new()) }
    }

    /// Register a repeating task
    ///
    /// # Errors
    ///
    /// Fails after shutdown, for a zero interval, or outside a tokio runtime.
    pub fn spawn_every(&self, interval: Duration, task: ScheduledTask) -> SchedulerResult<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(SchedulerError::AlreadyStopped);
        }
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| SchedulerError::StartFailed(err.to_string()))?;

        let cancel = self.cancellation_token.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("scheduled task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        task().await;
                    }
                }
            }
        });

        self.handles.lock().push(handle);
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        debug!(interval_ms, "scheduled task registered");
        Ok(())
    }

    /// Number of loops still running
    pub fn active_tasks(&self) -> usize {
        self.handles.lock().iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Cancel every loop and wait for them to finish
    ///
    /// A run that is in progress is allowed to complete first.
    #[instrument(skip(self))]
    pub async fn shutdown(&self, timeout: Duration) -> SchedulerResult<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(SchedulerError::AlreadyStopped);
        }
        info!("stopping interval scheduler");
        self.cancellation_token.cancel();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(SchedulerError::TaskJoinFailed(err.to_string())),
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "scheduled task did not stop in time");
                    return Err(SchedulerError::Timeout { seconds: timeout.as_secs() });
                }
            }
        }
        info!("interval scheduler stopped");
        Ok(())
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule(&self, interval: Duration, task: ScheduledTask) -> SyncResult<()> {
        self.spawn_every(interval, task).map_err(Into::into)
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
