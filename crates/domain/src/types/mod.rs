//! Domain types and models

pub mod connectivity;
pub mod memory;
pub mod queue;

pub use connectivity::ConnectivityState;
pub use memory::{
    zone_label, ForgetResult, MemoryRecord, MessageRole, QueueReason, RecallQuery,
    RecallResponse, SiteName, StatsResponse, StoreMetadata, StorePayload, StoreResult,
};
pub use queue::{OperationKind, OperationPayload, PendingOperation};
