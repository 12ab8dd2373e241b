//! Durable offline queue
//!
//! The queue is one persisted record, rewritten in full on every mutation.
//! Persistence is serialized by an async mutex that is held only around a
//! load/save pair, never while a drain handler runs, so new operations can be
//! enqueued while a drain is replaying.
//!
//! Invariants:
//! - replay order is insertion order
//! - `attempts` never exceeds the configured ceiling; an operation failing
//!   at the ceiling is dropped
//! - a drain only touches operations present when it started; anything
//!   enqueued meanwhile is kept after the retained operations

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stellar_domain::{OperationPayload, PendingOperation};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::QueueStore;
use crate::error::SyncResult;

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Operations the handler completed; removed from the queue
    pub processed: usize,
    /// Failed operations kept for a later drain
    pub retained: usize,
    /// Failed operations removed at the retry ceiling
    pub dropped: usize,
}

impl DrainReport {
    /// Operations handed to the handler during the pass
    pub fn attempted(&self) -> usize {
        self.processed + self.retained + self.dropped
    }
}

/// FIFO of pending writes persisted through a [`QueueStore`]
///
/// `persist` guards each load/save pair; `draining` lets only one drain run.
pub struct DurableQueue {
    store: Arc<dyn QueueStore>,
    max_retries: u32,
    persist: Mutex<()>,
    draining: Mutex<()>,
}

impl DurableQueue {
    /// Operations failing with `max_retries` attempts already recorded are dropped
    pub fn new(store: Arc<dyn QueueStore>, max_retries: u32) -> Self {
        Self { store, max_retries, persist: Mutex::new(()), draining: Mutex::new(()) }
    }

    /// Append an operation with zero attempts. Persisted before returning.
    pub async fn enqueue(&self, payload: OperationPayload) -> SyncResult<PendingOperation> {
        let operation = PendingOperation::new(payload);

        let _guard = self.persist.lock().await;
        let mut operations = self.store.load().await?;
        operations.push(operation.clone());
        self.store.save(&operations).await?;

        debug!(
            id = %operation.id,
            kind = %operation.kind(),
            queue_size = operations.len(),
            "operation queued"
        );
        Ok(operation)
    }

    /// Replay every queued operation once, in FIFO order.
    ///
    /// A concurrent call while a drain is in progress returns an empty
    /// report without touching the queue.
    #[instrument(skip_all)]
    pub async fn drain<F, Fut>(&self, mut handler: F) -> SyncResult<DrainReport>
    where
        F: FnMut(PendingOperation) -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        let Ok(_draining) = self.draining.try_lock() else {
            debug!("drain already in progress, skipping");
            return Ok(DrainReport::default());
        };

        let batch = {
            let _guard = self.persist.lock().await;
            self.store.load().await?
        };
        if batch.is_empty() {
            return Ok(DrainReport::default());
        }

        let batch_ids: HashSet<String> = batch.iter().map(|op| op.id.clone()).collect();
        let mut report = DrainReport::default();
        let mut retained = Vec::new();

        for mut operation in batch {
            match handler(operation.clone()).await {
                Ok(()) => report.processed += 1,
                Err(err) if operation.attempts < self.max_retries => {
                    operation.attempts += 1;
                    debug!(
                        id = %operation.id,
                        attempts = operation.attempts,
                        error = %err,
                        "replay failed, keeping operation"
                    );
                    retained.push(operation);
                }
                Err(err) => {
                    warn!(
                        id = %operation.id,
                        kind = %operation.kind(),
                        attempts = operation.attempts,
                        error = %err,
                        "replay failed at retry ceiling, dropping operation"
                    );
                    report.dropped += 1;
                }
            }
        }
        report.retained = retained.len();

        {
            let _guard = self.persist.lock().await;
            let current = self.store.load().await?;
            let current_ids: HashSet<&str> = current.iter().map(|op| op.id.as_str()).collect();

            // Cleared mid-drain operations stay cleared.
            let mut remaining: Vec<PendingOperation> = retained
                .into_iter()
                .filter(|op| current_ids.contains(op.id.as_str()))
                .collect();
            remaining.extend(current.into_iter().filter(|op| !batch_ids.contains(&op.id)));
            self.store.save(&remaining).await?;
        }

        info!(
            processed = report.processed,
            retained = report.retained,
            dropped = report.dropped,
            "queue drained"
        );
        Ok(report)
    }

    /// Number of queued operations, read from the store
    pub async fn size(&self) -> SyncResult<usize> {
        let _guard = self.persist.lock().await;
        Ok(self.store.load().await?.len())
    }

    /// Copy of the queued operations in replay order
    pub async fn snapshot(&self) -> SyncResult<Vec<PendingOperation>> {
        let _guard = self.persist.lock().await;
        self.store.load().await
    }

    /// Drop every queued operation, including ones a running drain holds
    pub async fn clear(&self) -> SyncResult<()> {
        let _guard = self.persist.lock().await;
        self.store.save(&[]).await?;
        info!("queue cleared");
        Ok(())
    }

    /// Retry ceiling per operation
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
