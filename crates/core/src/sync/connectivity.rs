//! Connectivity monitor
//!
//! Probes the health endpoint, persists the connected flag when it changes
//! and drains the offline queue on every not-connected to connected edge.
//! An `Unknown` previous state counts as not connected, so the first
//! successful probe after startup also drains.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stellar_domain::ConnectivityState;
use tracing::{info, instrument, warn};

use super::executor::RequestExecutor;
use super::ports::{ConnectivityStore, ScheduledTask, Scheduler, TaskFuture};
use super::queue::DrainReport;
use super::replay::QueueReplayer;
use crate::error::SyncResult;

/// Result of one connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectivityCheck {
    pub previous: ConnectivityState,
    pub current: ConnectivityState,
    /// Present when this check triggered a drain that completed
    pub drain: Option<DrainReport>,
}

impl ConnectivityCheck {
    pub fn reconnected(&self) -> bool {
        !self.previous.is_connected() && self.current.is_connected()
    }
}

pub struct ConnectivityMonitor {
    executor: Arc<RequestExecutor>,
    store: Arc<dyn ConnectivityStore>,
    replayer: Arc<QueueReplayer>,
    interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        executor: Arc<RequestExecutor>,
        store: Arc<dyn ConnectivityStore>,
        replayer: Arc<QueueReplayer>,
        interval: Duration,
    ) -> Self {
        Self { executor, store, replayer, interval }
    }

    /// Probe the server without touching any state
    pub async fn probe(&self) -> bool {
        self.executor.probe().await
    }

    /// Last persisted state; unreadable state is `Unknown`
    pub async fn state(&self) -> ConnectivityState {
        match self.store.load().await {
            Ok(flag) => ConnectivityState::from_flag(flag),
            Err(err) => {
                warn!(error = %err, "failed to read connectivity state");
                ConnectivityState::Unknown
            }
        }
    }

    /// Run one probe and apply the state transition. Never fails.
    #[instrument(skip(self))]
    pub async fn check(&self) -> ConnectivityCheck {
        let previous = self.state().await;
        let connected = self.probe().await;
        let current = ConnectivityState::from_probe(connected);

        if previous != current {
            if let Err(err) = self.store.save(connected).await {
                warn!(error = %err, "failed to persist connectivity state");
            }
            info!(?previous, ?current, "connectivity changed");
        }

        let mut check = ConnectivityCheck { previous, current, drain: None };
        if check.reconnected() {
            match self.replayer.flush().await {
                Ok(report) => check.drain = Some(report),
                Err(err) => warn!(error = %err, "queue drain after reconnect failed"),
            }
        }
        check
    }

    /// Run one check now, then register the periodic check on `scheduler`
    pub async fn start(self: &Arc<Self>, scheduler: &dyn Scheduler) -> SyncResult<ConnectivityCheck> {
        let first = self.check().await;

        let monitor = Arc::clone(self);
        let task: ScheduledTask = Arc::new(move || -> TaskFuture {
            let monitor = Arc::clone(&monitor);
            Box::pin(async move {
                monitor.check().await;
            })
        });
        scheduler.schedule(self.interval, task)?;

        info!(interval_secs = self.interval.as_secs(), "connectivity monitor started");
        Ok(first)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
