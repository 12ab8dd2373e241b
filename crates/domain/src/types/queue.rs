//! Offline queue records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;
use crate::types::memory::StorePayload;

/// Kind of a deferred mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Store,
    Forget,
}

impl_domain_status_conversions!(OperationKind {
    Store => "store",
    Forget => "forget",
});

/// Kind-specific data of a deferred mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum OperationPayload {
    Store(StorePayload),
    Forget {
        #[serde(rename = "memoryId")]
        memory_id: String,
    },
}

impl OperationPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Store(_) => OperationKind::Store,
            Self::Forget { .. } => OperationKind::Forget,
        }
    }
}

/// A mutation waiting in the offline queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: String,
    #[serde(flatten)]
    pub payload: OperationPayload,
    pub enqueued_at: DateTime<Utc>,
    /// Failed replays so far
    #[serde(default)]
    pub attempts: u32,
}

impl PendingOperation {
    /// Fresh operation with a new UUID and zero attempts
    pub fn new(payload: OperationPayload) -> Self {
        Self { id: Uuid::new_v4().to_string(), payload, enqueued_at: Utc::now(), attempts: 0 }
    }

    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_operations_get_distinct_ids() {
        let a = PendingOperation::new(OperationPayload::Forget { memory_id: "m1".into() });
        let b = PendingOperation::new(OperationPayload::Forget { memory_id: "m1".into() });
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.attempts, 0);
        assert_eq!(a.kind(), OperationKind::Forget);
    }

    #[test]
    fn persisted_shape_is_flat() {
        let op = PendingOperation::new(OperationPayload::Forget { memory_id: "m9".into() });
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["action"], "forget");
        assert_eq!(value["payload"], json!({"memoryId": "m9"}));
        assert_eq!(value["attempts"], 0);
        assert!(value["enqueued_at"].is_string());
    }

    #[test]
    fn missing_attempts_defaults_to_zero() {
        let op: PendingOperation = serde_json::from_value(json!({
            "id": "q-1",
            "action": "forget",
            "payload": {"memoryId": "m2"},
            "enqueued_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(op.attempts, 0);
        assert_eq!(op.payload, OperationPayload::Forget { memory_id: "m2".into() });
    }
}
