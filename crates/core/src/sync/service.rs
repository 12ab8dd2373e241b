//! Sync facade consumed by the message router
//!
//! Write-path failures are absorbed into the offline queue and read-path
//! failures into empty defaults; no operation here returns an error to the
//! caller except the queue utilities.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stellar_common::{BackoffPolicy, Clock, SlidingWindowConfig, SlidingWindowLimiter, SystemClock};
use stellar_domain::{
    Config, ConnectivityState, ForgetResult, OperationPayload, QueueReason, RecallQuery,
    RecallResponse, StatsResponse, StorePayload, StoreResult,
};
use tracing::{debug, error, instrument, warn};

use super::connectivity::{ConnectivityCheck, ConnectivityMonitor};
use super::executor::RequestExecutor;
use super::metrics::{MetricsSnapshot, SyncMetrics};
use super::ports::{ConnectivityStore, HttpTransport, QueueStore, Scheduler};
use super::queue::{DrainReport, DurableQueue};
use super::replay::QueueReplayer;
use super::request::ApiRequest;
use crate::error::{SyncError, SyncResult};

/// Tunables for [`SyncService`], usually derived from [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub backoff: BackoffPolicy,
    pub rate_limit: SlidingWindowConfig,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub health_interval: Duration,
    pub max_queue_retries: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        let backoff_base = config.api.backoff_base();
        Self {
            backoff: BackoffPolicy {
                initial_delay: backoff_base,
                max_delay: backoff_base
                    .saturating_mul(2_u32.saturating_pow(config.api.max_backoff_retries)),
                max_retries: config.api.max_backoff_retries,
            },
            rate_limit: SlidingWindowConfig {
                max_requests: config.rate_limit.max_store_per_window,
                window: config.rate_limit.window(),
            },
            request_timeout: config.api.request_timeout(),
            health_timeout: config.api.health_timeout(),
            health_interval: config.sync.health_interval(),
            max_queue_retries: config.sync.max_queue_retries,
        }
    }
}

/// Queue depth and counters, as reported to the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub size: usize,
    pub connectivity: ConnectivityState,
    pub metrics: MetricsSnapshot,
}

/// Store/recall/forget/stats against the memory server with offline fallback
pub struct SyncService<C: Clock = SystemClock> {
    executor: Arc<RequestExecutor>,
    limiter: SlidingWindowLimiter<C>,
    queue: Arc<DurableQueue>,
    replayer: Arc<QueueReplayer>,
    monitor: Arc<ConnectivityMonitor>,
    metrics: Arc<SyncMetrics>,
}

impl SyncService<SystemClock> {
    /// Create a service backed by the system clock
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        queue_store: Arc<dyn QueueStore>,
        connectivity_store: Arc<dyn ConnectivityStore>,
        settings: SyncSettings,
    ) -> SyncResult<Self> {
        Self::with_clock(transport, queue_store, connectivity_store, settings, SystemClock)
    }
}

impl<C: Clock> SyncService<C> {
    /// Create a service with a custom clock for the store rate limiter
    pub fn with_clock(
        transport: Arc<dyn HttpTransport>,
        queue_store: Arc<dyn QueueStore>,
        connectivity_store: Arc<dyn ConnectivityStore>,
        settings: SyncSettings,
        clock: C,
    ) -> SyncResult<Self> {
        settings.backoff.validate()?;
        let limiter = SlidingWindowLimiter::with_clock(settings.rate_limit, clock)?;

        let metrics = Arc::new(SyncMetrics::new());
        let executor = Arc::new(RequestExecutor::new(
            transport,
            settings.backoff,
            settings.request_timeout,
            settings.health_timeout,
            Arc::clone(&metrics),
        ));
        let queue = Arc::new(DurableQueue::new(queue_store, settings.max_queue_retries));
        let replayer = Arc::new(QueueReplayer::new(
            Arc::clone(&executor),
            Arc::clone(&queue),
            Arc::clone(&metrics),
        ));
        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::clone(&executor),
            connectivity_store,
            Arc::clone(&replayer),
            settings.health_interval,
        ));

        Ok(Self { executor, limiter, queue, replayer, monitor, metrics })
    }

    /// Store a memory, or queue it when rate limited or unreachable
    ///
    /// Any 2xx answer counts as stored, whatever its body looks like.
    #[instrument(skip_all, fields(source = %payload.metadata.source))]
    pub async fn store(&self, payload: StorePayload) -> StoreResult {
        if !self.limiter.admit() {
            let err = SyncError::RateLimited;
            debug!(error = %err, category = ?err.category(), "store denied, queueing");
            self.metrics.record_store_queued(true);
            self.defer(OperationPayload::Store(payload)).await;
            return StoreResult::queued(QueueReason::RateLimited);
        }

        let request = match ApiRequest::store(&payload) {
            Ok(request) => request,
            Err(err) => {
                error!(error = %err, "store payload could not be encoded");
                return StoreResult { id: None, error: Some(err.to_string()), queued: None };
            }
        };

        match self.executor.execute(&request).await {
            Ok(response) => {
                self.metrics.record_store_sent();
                response.json::<StoreResult>().unwrap_or_else(|err| {
                    debug!(status = response.status, error = %err, "store accepted without a readable body");
                    StoreResult { id: None, error: None, queued: None }
                })
            }
            Err(err) if err.is_delivery_failure() => {
                warn!(error = %err, category = ?err.category(), "store failed, queueing for replay");
                self.metrics.record_store_queued(false);
                self.defer(OperationPayload::Store(payload)).await;
                StoreResult::queued(QueueReason::Offline)
            }
            Err(err) => {
                error!(error = %err, category = ?err.category(), "store failed without a server answer");
                StoreResult { id: None, error: Some(err.to_string()), queued: None }
            }
        }
    }

    /// Recall memories; any failure yields an empty list
    #[instrument(skip_all, fields(limit = query.limit))]
    pub async fn recall(&self, query: RecallQuery) -> RecallResponse {
        match self.executor.execute_json(&ApiRequest::recall(&query)).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "recall failed, returning no memories");
                RecallResponse::default()
            }
        }
    }

    /// Delete a memory, or queue the delete when it fails
    ///
    /// A 2xx answer with no decodable body (such as 204) means removed.
    #[instrument(skip(self))]
    pub async fn forget(&self, memory_id: String) -> ForgetResult {
        match self.executor.execute(&ApiRequest::forget(&memory_id)).await {
            Ok(response) => response.json().unwrap_or(ForgetResult { removed: true }),
            Err(err) if err.is_delivery_failure() => {
                warn!(error = %err, "forget failed, queueing for replay");
                self.metrics.record_forget_queued();
                self.defer(OperationPayload::Forget { memory_id }).await;
                ForgetResult { removed: false }
            }
            Err(err) => {
                error!(error = %err, category = ?err.category(), "forget failed without a server answer");
                ForgetResult { removed: false }
            }
        }
    }

    /// Memory counts; any failure yields zeroed stats
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> StatsResponse {
        match self.executor.execute_json(&ApiRequest::stats()).await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "stats failed, returning zeroed stats");
                StatsResponse::default()
            }
        }
    }

    /// Single health probe, no state change
    pub async fn check_health(&self) -> bool {
        self.executor.probe().await
    }

    /// Probe and apply the connectivity transition, draining on reconnect
    pub async fn check_connectivity(&self) -> ConnectivityCheck {
        self.monitor.check().await
    }

    /// Drain the offline queue once
    pub async fn flush_queue(&self) -> SyncResult<DrainReport> {
        self.replayer.flush().await
    }

    /// Eager connectivity check plus periodic checks on `scheduler`
    pub async fn start_monitor(&self, scheduler: &dyn Scheduler) -> SyncResult<ConnectivityCheck> {
        self.monitor.start(scheduler).await
    }

    pub async fn queue_status(&self) -> SyncResult<QueueStatus> {
        Ok(QueueStatus {
            size: self.queue.size().await?,
            connectivity: self.monitor.state().await,
            metrics: self.metrics.snapshot(),
        })
    }

    pub fn queue(&self) -> &Arc<DurableQueue> {
        &self.queue
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Enqueue, logging instead of failing: the caller still gets its
    /// queued answer when persistence is broken.
    async fn defer(&self, payload: OperationPayload) {
        let kind = payload.kind();
        if let Err(err) = self.queue.enqueue(payload).await {
            error!(%kind, error = %err, "failed to persist operation to offline queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stellar_common::MockClock;
    use stellar_domain::OperationKind;

    use super::*;
    use crate::testing::{sample_payload, MemoryConnectivityStore, MemoryQueueStore, ScriptedTransport};

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        queue_store: Arc<MemoryQueueStore>,
        clock: MockClock,
        service: SyncService<MockClock>,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(ScriptedTransport::new());
        let queue_store = Arc::new(MemoryQueueStore::new());
        let clock = MockClock::new();
        let service = SyncService::with_clock(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            Arc::clone(&queue_store) as Arc<dyn QueueStore>,
            Arc::new(MemoryConnectivityStore::new()),
            SyncSettings::default(),
            clock.clone(),
        )
        .unwrap();
        Fixture { transport, queue_store, clock, service }
    }

    #[tokio::test]
    async fn third_store_in_window_is_rate_limited() {
        let f = fixture();
        f.transport.set_fallback_json(200, json!({"id": "mem-1"}));

        assert_eq!(f.service.store(sample_payload("a")).await, StoreResult::stored("mem-1"));
        assert_eq!(f.service.store(sample_payload("b")).await, StoreResult::stored("mem-1"));
        let third = f.service.store(sample_payload("c")).await;

        assert_eq!(third, StoreResult::queued(QueueReason::RateLimited));
        assert_eq!(f.transport.request_count(), 2);
        assert_eq!(f.queue_store.operations().len(), 1);
        assert_eq!(f.service.metrics().snapshot().rate_limited, 1);
    }

    #[tokio::test]
    async fn window_reopens_after_a_second() {
        let f = fixture();
        f.transport.set_fallback_json(200, json!({"id": "mem-1"}));

        f.service.store(sample_payload("a")).await;
        f.service.store(sample_payload("b")).await;
        f.clock.advance(Duration::from_millis(1_000));

        assert!(!f.service.store(sample_payload("c")).await.is_queued());
    }

    #[tokio::test]
    async fn offline_store_is_queued() {
        let f = fixture();

        let result = f.service.store(sample_payload("a")).await;

        assert_eq!(result, StoreResult::queued(QueueReason::Offline));
        let queued = f.queue_store.operations();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind(), OperationKind::Store);
        assert_eq!(queued[0].payload, OperationPayload::Store(sample_payload("a")));
    }

    #[tokio::test]
    async fn http_error_store_is_queued() {
        let f = fixture();
        f.transport.push_status(500);

        let result = f.service.store(sample_payload("a")).await;
        assert_eq!(result.error.as_deref(), Some("offline"));
        assert_eq!(f.queue_store.operations().len(), 1);
    }

    #[tokio::test]
    async fn created_without_body_counts_as_stored() {
        let f = fixture();
        f.transport.push_empty(201);

        let result = f.service.store(sample_payload("a")).await;

        assert!(!result.is_queued());
        assert_eq!(result.id, None);
        assert_eq!(result.error, None);
        assert_eq!(f.service.queue_status().await.unwrap().size, 0);
        assert_eq!(f.service.metrics().snapshot().stores_sent, 1);
    }

    #[tokio::test]
    async fn unreadable_success_body_is_not_queued() {
        let f = fixture();
        f.transport.push_json(200, json!(["unexpected"]));

        let result = f.service.store(sample_payload("a")).await;

        assert!(!result.is_queued());
        assert!(f.queue_store.operations().is_empty());
    }

    #[tokio::test]
    async fn queue_write_failure_still_answers_queued() {
        let f = fixture();
        f.queue_store.fail_saves(true);

        let result = f.service.store(sample_payload("a")).await;
        assert!(result.is_queued());
    }

    #[tokio::test]
    async fn recall_and_stats_fall_back_to_defaults() {
        let f = fixture();

        let recall = f
            .service
            .recall(RecallQuery { query: "rust".into(), limit: 5, source: None })
            .await;
        assert!(recall.memories.is_empty());
        assert_eq!(f.service.get_stats().await, StatsResponse::default());
        assert!(f.queue_store.operations().is_empty());
    }

    #[tokio::test]
    async fn recall_returns_server_memories() {
        let f = fixture();
        f.transport.push_json(
            200,
            json!({"memories": [{"id": "m1", "content": "prefers tabs", "zone": 0,
                "importance": 0.8, "source": "chatgpt", "createdAt": "2026-01-01"}]}),
        );

        let recall = f
            .service
            .recall(RecallQuery { query: "tabs".into(), limit: 3, source: None })
            .await;
        assert_eq!(recall.memories.len(), 1);
        assert_eq!(recall.memories[0].id, "m1");
    }

    #[tokio::test]
    async fn failed_forget_is_queued() {
        let f = fixture();

        let result = f.service.forget("m1".into()).await;

        assert!(!result.removed);
        assert_eq!(
            f.queue_store.operations()[0].payload,
            OperationPayload::Forget { memory_id: "m1".into() }
        );
        assert_eq!(f.service.metrics().snapshot().forgets_queued, 1);
    }

    #[tokio::test]
    async fn no_content_forget_is_removed() {
        let f = fixture();
        f.transport.push_empty(204);

        let result = f.service.forget("m1".into()).await;

        assert!(result.removed);
        assert_eq!(f.service.queue_status().await.unwrap().size, 0);
        assert_eq!(f.service.metrics().snapshot().forgets_queued, 0);
    }

    #[tokio::test]
    async fn queued_store_replays_once_online() {
        let f = fixture();
        f.service.store(sample_payload("a")).await;
        f.transport.set_fallback_json(200, json!({"id": "mem-9"}));

        let report = f.service.flush_queue().await.unwrap();

        assert_eq!(report.processed, 1);
        let status = f.service.queue_status().await.unwrap();
        assert_eq!(status.size, 0);
        assert_eq!(status.metrics.replayed, 1);
    }

    #[tokio::test]
    async fn settings_follow_config() {
        let mut config = Config::default();
        config.api.backoff_base_ms = 250;
        config.api.max_backoff_retries = 2;
        config.rate_limit.max_store_per_window = 5;

        let settings = SyncSettings::from_config(&config);
        assert_eq!(settings.backoff.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(settings.backoff.max_attempts(), 3);
        assert_eq!(settings.rate_limit.max_requests, 5);
        assert_eq!(settings.health_interval, Duration::from_secs(30));
    }
}
