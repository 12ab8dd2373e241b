//! Memory API payloads and responses
//!
//! Field names follow the server's JSON contract: camelCase inside store
//! metadata and memory records, snake_case in stats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Chat site a memory was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteName {
    Chatgpt,
    Claude,
    Gemini,
}

impl_domain_status_conversions!(SiteName {
    Chatgpt => "chatgpt",
    Claude => "claude",
    Gemini => "gemini",
});

/// Author of a captured chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl_domain_status_conversions!(MessageRole {
    User => "user",
    Assistant => "assistant",
});

/// Provenance attached to every stored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    pub source: SiteName,
    pub url: String,
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Capture time in milliseconds since the UNIX epoch
    pub timestamp: u64,
}

/// Body of `POST /api/v1/store`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePayload {
    pub content: String,
    pub importance: f64,
    pub metadata: StoreMetadata,
}

/// Why a store was deferred to the offline queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueReason {
    RateLimited,
    Offline,
}

impl_domain_status_conversions!(QueueReason {
    RateLimited => "rate_limited",
    Offline => "offline",
});

/// Outcome of a store call as seen by the caller
///
/// `id` is `None` whenever the memory was not accepted by the server yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreResult {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued: Option<bool>,
}

impl StoreResult {
    pub fn stored(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), error: None, queued: None }
    }

    pub fn queued(reason: QueueReason) -> Self {
        Self { id: None, error: Some(reason.to_string()), queued: Some(true) }
    }

    pub fn is_queued(&self) -> bool {
        self.queued.unwrap_or(false)
    }
}

/// Parameters of `GET /api/v1/recall`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallQuery {
    pub query: String,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SiteName>,
}

/// A memory as returned by recall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub zone: i64,
    pub importance: f64,
    pub source: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl MemoryRecord {
    pub fn zone_label(&self) -> &'static str {
        zone_label(self.zone)
    }
}

/// Human label for a memory zone
pub fn zone_label(zone: i64) -> &'static str {
    match zone {
        0 => "Core",
        1 => "Inner",
        2 => "Outer",
        3 => "Belt",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallResponse {
    #[serde(default)]
    pub memories: Vec<MemoryRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgetResult {
    pub removed: bool,
}

/// Server-side memory counts; the zeroed default stands in when unreachable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_memories: u64,
    #[serde(default)]
    pub zones: BTreeMap<String, u64>,
}
