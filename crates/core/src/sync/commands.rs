//! Message router over [`SyncService`]
//!
//! Commands arrive as JSON objects `{"type": "...", "payload": ...}` and
//! every command produces a JSON answer; failures are reported inside the
//! answer, never as an error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stellar_common::Clock;
use stellar_domain::{RecallQuery, StorePayload};
use tracing::{debug, warn};

use super::service::SyncService;

/// Payload of a `FORGET` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgetRequest {
    #[serde(rename = "memoryId")]
    pub memory_id: String,
}

/// Commands understood by the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncCommand {
    Store(StorePayload),
    Recall(RecallQuery),
    Forget(ForgetRequest),
    GetStats,
    CheckConnection,
    FlushQueue,
    QueueStatus,
}

impl SyncCommand {
    /// Wire names of every command
    pub const TYPES: [&'static str; 7] = [
        "STORE",
        "RECALL",
        "FORGET",
        "GET_STATS",
        "CHECK_CONNECTION",
        "FLUSH_QUEUE",
        "QUEUE_STATUS",
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Store(_) => "STORE",
            Self::Recall(_) => "RECALL",
            Self::Forget(_) => "FORGET",
            Self::GetStats => "GET_STATS",
            Self::CheckConnection => "CHECK_CONNECTION",
            Self::FlushQueue => "FLUSH_QUEUE",
            Self::QueueStatus => "QUEUE_STATUS",
        }
    }
}

/// Run a decoded command against the service
pub async fn dispatch<C: Clock>(service: &SyncService<C>, command: SyncCommand) -> Value {
    debug!(command = command.type_name(), "dispatching command");
    match command {
        SyncCommand::Store(payload) => to_answer(&service.store(payload).await),
        SyncCommand::Recall(query) => to_answer(&service.recall(query).await),
        SyncCommand::Forget(request) => to_answer(&service.forget(request.memory_id).await),
        SyncCommand::GetStats => to_answer(&service.get_stats().await),
        SyncCommand::CheckConnection => json!({ "connected": service.check_health().await }),
        SyncCommand::FlushQueue => match service.flush_queue().await {
            Ok(report) => to_answer(&report),
            Err(err) => error_answer(err),
        },
        SyncCommand::QueueStatus => match service.queue_status().await {
            Ok(status) => to_answer(&status),
            Err(err) => error_answer(err),
        },
    }
}

/// Decode a raw JSON message and run it
pub async fn dispatch_raw<C: Clock>(service: &SyncService<C>, raw: &str) -> Value {
    let message: Value = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(err) => return json!({ "error": format!("Invalid message: {err}") }),
    };

    let known = message
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| SyncCommand::TYPES.contains(&kind));
    if !known {
        warn!(message_type = ?message.get("type"), "unknown message type");
        return json!({ "error": "Unknown message type" });
    }

    match serde_json::from_value::<SyncCommand>(message) {
        Ok(command) => dispatch(service, command).await,
        Err(err) => json!({ "error": format!("Invalid payload: {err}") }),
    }
}

fn to_answer<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| error_answer(err))
}

fn error_answer(err: impl std::fmt::Display) -> Value {
    json!({ "error": err.to_string() })
}
