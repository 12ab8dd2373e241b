//! Replays queued operations straight through the request executor.
//!
//! Replay never goes back through [`super::service::SyncService`]: a failed
//! replay is reported to the drain, which owns the retry bookkeeping, and
//! nothing is enqueued a second time.

use std::sync::Arc;

use stellar_domain::{OperationPayload, PendingOperation};
use tracing::{debug, instrument};

use super::executor::RequestExecutor;
use super::metrics::SyncMetrics;
use super::queue::{DrainReport, DurableQueue};
use super::request::ApiRequest;
use crate::error::SyncResult;

pub struct QueueReplayer {
    executor: Arc<RequestExecutor>,
    queue: Arc<DurableQueue>,
    metrics: Arc<SyncMetrics>,
}

impl QueueReplayer {
    pub fn new(
        executor: Arc<RequestExecutor>,
        queue: Arc<DurableQueue>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self { executor, queue, metrics }
    }

    /// Drain the queue once, replaying each operation
    #[instrument(skip(self))]
    pub async fn flush(&self) -> SyncResult<DrainReport> {
        let report = self.queue.drain(|operation| self.replay(operation)).await?;
        if report.attempted() > 0 {
            self.metrics.record_drain(report.processed, report.retained, report.dropped);
        }
        Ok(report)
    }

    /// Send one queued operation; any failure is returned to the drain
    pub async fn replay(&self, operation: PendingOperation) -> SyncResult<()> {
        let request = match &operation.payload {
            OperationPayload::Store(payload) => ApiRequest::store(payload)?,
            OperationPayload::Forget { memory_id } => ApiRequest::forget(memory_id),
        };
        self.executor.execute(&request).await?;
        debug!(id = %operation.id, kind = %operation.kind(), "replayed queued operation");
        Ok(())
    }
}
