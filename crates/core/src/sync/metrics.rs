use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Counters for the sync client
#[derive(Debug, Default)]
pub struct SyncMetrics {
    pub stores_sent: AtomicU64,
    pub stores_queued: AtomicU64,
    pub rate_limited: AtomicU64,
    pub forgets_queued: AtomicU64,
    pub replayed: AtomicU64,
    pub retained: AtomicU64,
    pub dropped: AtomicU64,
    pub drains: AtomicU64,
    pub rate_limit_retries: AtomicU64,
}

impl SyncMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a store accepted by the server
    pub fn record_store_sent(&self) {
        self.stores_sent.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a store deferred to the offline queue
    pub fn record_store_queued(&self, rate_limited: bool) {
        self.stores_queued.fetch_add(1, AtomicOrdering::Relaxed);
        if rate_limited {
            self.rate_limited.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    /// Record a forget deferred to the offline queue
    pub fn record_forget_queued(&self) {
        self.forgets_queued.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a 429 answered with a backoff delay
    pub fn record_rate_limit_retry(&self) {
        self.rate_limit_retries.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record the outcome of one drain
    pub fn record_drain(&self, processed: usize, retained: usize, dropped: usize) {
        self.drains.fetch_add(1, AtomicOrdering::Relaxed);
        self.replayed.fetch_add(as_count(processed), AtomicOrdering::Relaxed);
        self.retained.fetch_add(as_count(retained), AtomicOrdering::Relaxed);
        self.dropped.fetch_add(as_count(dropped), AtomicOrdering::Relaxed);
    }

    /// Get snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stores_sent: self.stores_sent.load(AtomicOrdering::Relaxed),
            stores_queued: self.stores_queued.load(AtomicOrdering::Relaxed),
            rate_limited: self.rate_limited.load(AtomicOrdering::Relaxed),
            forgets_queued: self.forgets_queued.load(AtomicOrdering::Relaxed),
            replayed: self.replayed.load(AtomicOrdering::Relaxed),
            retained: self.retained.load(AtomicOrdering::Relaxed),
            dropped: self.dropped.load(AtomicOrdering::Relaxed),
            drains: self.drains.load(AtomicOrdering::Relaxed),
            rate_limit_retries: self.rate_limit_retries.load(AtomicOrdering::Relaxed),
        }
    }
}

fn as_count(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Point-in-time copy of [`SyncMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub stores_sent: u64,
    pub stores_queued: u64,
    pub rate_limited: u64,
    pub forgets_queued: u64,
    pub replayed: u64,
    pub retained: u64,
    pub dropped: u64,
    pub drains: u64,
    pub rate_limit_retries: u64,
}
