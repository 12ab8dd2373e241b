//! In-memory port implementations for tests
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for downstream crates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use stellar_domain::{MessageRole, PendingOperation, SiteName, StoreMetadata, StorePayload};

use crate::error::{SyncError, SyncResult};
use crate::sync::ports::{ConnectivityStore, HttpTransport, QueueStore, ScheduledTask, Scheduler};
use crate::sync::request::{ApiRequest, ApiResponse};

/// Store payload with fixed metadata
pub fn sample_payload(content: &str) -> StorePayload {
    StorePayload {
        content: content.to_string(),
        importance: 0.5,
        metadata: StoreMetadata {
            source: SiteName::Chatgpt,
            url: "https://chatgpt.com/c/test".to_string(),
            role: MessageRole::User,
            conversation_id: Some("test".to_string()),
            timestamp: 1_767_225_600_000,
        },
    }
}

/// Transport answering from a script, then from a fallback.
///
/// With no scripted response and no fallback every request fails with
/// [`SyncError::Network`], i.e. the server is unreachable.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ApiResponse>>,
    fallback: Mutex<Option<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: u16) {
        self.script.lock().push_back(ApiResponse::new(status, "{}"));
    }

    /// Queue a response with no body at all, like a 204
    pub fn push_empty(&self, status: u16) {
        self.script.lock().push_back(ApiResponse::new(status, Vec::new()));
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.script.lock().push_back(ApiResponse::json_body(status, &body));
    }

    pub fn set_fallback_status(&self, status: u16) {
        *self.fallback.lock() = Some(ApiResponse::new(status, "{}"));
    }

    pub fn set_fallback_json(&self, status: u16, body: serde_json::Value) {
        *self.fallback.lock() = Some(ApiResponse::json_body(status, &body));
    }

    /// Make unscripted requests fail again
    pub fn go_offline(&self) {
        *self.fallback.lock() = None;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> SyncResult<ApiResponse> {
        self.requests.lock().push(request.clone());
        let scripted = self.script.lock().pop_front();
        scripted
            .or_else(|| self.fallback.lock().clone())
            .ok_or_else(|| SyncError::Network("connection refused".to_string()))
    }
}

/// Queue store kept in memory
#[derive(Default)]
pub struct MemoryQueueStore {
    operations: Mutex<Vec<PendingOperation>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> Vec<PendingOperation> {
        self.operations.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn load(&self) -> SyncResult<Vec<PendingOperation>> {
        Ok(self.operations.lock().clone())
    }

    async fn save(&self, operations: &[PendingOperation]) -> SyncResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("queue store is read-only".to_string()));
        }
        *self.operations.lock() = operations.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connectivity flag kept in memory
#[derive(Default)]
pub struct MemoryConnectivityStore {
    flag: Mutex<Option<bool>>,
    saves: AtomicUsize,
    fail_loads: AtomicBool,
}

impl MemoryConnectivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag without counting a save
    pub fn set(&self, flag: Option<bool>) {
        *self.flag.lock() = flag;
    }

    pub fn get(&self) -> Option<bool> {
        *self.flag.lock()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityStore for MemoryConnectivityStore {
    async fn load(&self) -> SyncResult<Option<bool>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("connectivity record unreadable".to_string()));
        }
        Ok(*self.flag.lock())
    }

    async fn save(&self, connected: bool) -> SyncResult<()> {
        *self.flag.lock() = Some(connected);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scheduler whose tasks run only when the test calls [`ManualScheduler::tick`]
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<(Duration, ScheduledTask)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intervals(&self) -> Vec<Duration> {
        self.tasks.lock().iter().map(|(interval, _)| *interval).collect()
    }

    /// Run every registered task once, in registration order
    pub async fn tick(&self) {
        let tasks: Vec<ScheduledTask> =
            self.tasks.lock().iter().map(|(_, task)| Arc::clone(task)).collect();
        for task in tasks {
            task().await;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, interval: Duration, task: ScheduledTask) -> SyncResult<()> {
        self.tasks.lock().push((interval, task));
        Ok(())
    }
}
