//! Request execution with rate-limit backoff
//!
//! A 429 answer is the only status that is retried. The delay follows every
//! 429, the last one included, so with the default policy a request that is
//! always rate limited is attempted four times and waits 1 s, 2 s, 4 s and
//! 8 s before failing. Only the calling task sleeps.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use stellar_common::BackoffPolicy;
use tracing::{debug, warn};

use super::metrics::SyncMetrics;
use super::ports::HttpTransport;
use super::request::{ApiRequest, ApiResponse};
use crate::error::{SyncError, SyncResult};

/// Issues requests through an [`HttpTransport`]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    backoff: BackoffPolicy,
    request_timeout: Duration,
    health_timeout: Duration,
    metrics: Arc<SyncMetrics>,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        backoff: BackoffPolicy,
        request_timeout: Duration,
        health_timeout: Duration,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self { transport, backoff, request_timeout, health_timeout, metrics }
    }

    /// Execute a request, retrying on 429 with exponential backoff.
    ///
    /// Fails with [`SyncError::Http`] on a terminal non-2xx status (429 once
    /// retries are exhausted) and with the transport's error when no
    /// response was obtained.
    pub async fn execute(&self, request: &ApiRequest) -> SyncResult<ApiResponse> {
        let request = self.with_default_timeout(request);

        for attempt in 0..self.backoff.max_attempts() {
            let response = self.transport.send(&request).await?;

            if response.is_rate_limited() {
                let delay = self.backoff.delay_for(attempt);
                warn!(
                    method = request.method.as_str(),
                    path = %request.path,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "server rate limited request, backing off"
                );
                self.metrics.record_rate_limit_retry();
                tokio::time::sleep(delay).await;
                continue;
            }

            if !response.is_success() {
                debug!(path = %request.path, status = response.status, "request failed");
                return Err(SyncError::Http { status: response.status });
            }

            return Ok(response);
        }

        Err(SyncError::Http { status: 429 })
    }

    /// Execute and decode a JSON body
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> SyncResult<T> {
        self.execute(request).await?.json()
    }

    /// GET the health endpoint once. Any error or non-2xx status is `false`.
    pub async fn probe(&self) -> bool {
        let request = ApiRequest::health().with_timeout(self.health_timeout);
        match self.transport.send(&request).await {
            Ok(response) => response.is_success(),
            Err(err) => {
                debug!(error = %err, "health probe failed");
                false
            }
        }
    }

    fn with_default_timeout(&self, request: &ApiRequest) -> ApiRequest {
        let mut request = request.clone();
        if request.timeout.is_none() {
            request.timeout = Some(self.request_timeout);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::testing::ScriptedTransport;

    fn executor(transport: &Arc<ScriptedTransport>, metrics: &Arc<SyncMetrics>) -> RequestExecutor {
        RequestExecutor::new(
            Arc::clone(transport) as Arc<dyn HttpTransport>,
            BackoffPolicy::default(),
            Duration::from_secs(10),
            Duration::from_secs(3),
            Arc::clone(metrics),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_backoff_on_persistent_429() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_fallback_status(429);
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        let started = Instant::now();
        let err = executor.execute(&ApiRequest::stats()).await.unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert_eq!(transport.request_count(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(15));
        assert_eq!(metrics.snapshot().rate_limit_retries, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_single_429() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status(429);
        transport.push_json(200, serde_json::json!({"id": "mem-1"}));
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        let started = Instant::now();
        let body: serde_json::Value = executor.execute_json(&ApiRequest::stats()).await.unwrap();

        assert_eq!(body["id"], "mem-1");
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn other_statuses_are_terminal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status(503);
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        let started = Instant::now();
        let err = executor.execute(&ApiRequest::stats()).await.unwrap_err();

        assert!(matches!(err, SyncError::Http { status: 503 }));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn network_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        let err = executor.execute(&ApiRequest::stats()).await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn applies_timeouts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_fallback_status(200);
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        assert!(executor.probe().await);
        executor.execute(&ApiRequest::stats()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/api/v1/health");
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(3)));
        assert_eq!(requests[1].timeout, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn probe_is_false_on_error_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status(500);
        let metrics = Arc::new(SyncMetrics::new());
        let executor = executor(&transport, &metrics);

        assert!(!executor.probe().await);
        assert!(!executor.probe().await);
    }
}
