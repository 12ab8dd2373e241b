use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stellar_core::{QueueStore, SyncError, SyncResult};
use stellar_domain::constants::QUEUE_STORAGE_KEY;
use stellar_domain::PendingOperation;
use tracing::{error, warn};

use super::json_file::JsonFileStore;

const PERSISTENCE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedQueue {
    version: u32,
    saved_at: DateTime<Utc>,
    operations: Vec<PendingOperation>,
}

/// Offline queue persisted as `stellar_offline_queue.json`
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    file: JsonFileStore,
}

impl FileQueueStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { file: JsonFileStore::in_dir(data_dir, QUEUE_STORAGE_KEY) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn load(&self) -> SyncResult<Vec<PendingOperation>> {
        match self.file.read::<PersistedQueue>().await {
            Ok(Some(persisted)) => {
                if persisted.version != PERSISTENCE_VERSION {
                    warn!(
                        expected = PERSISTENCE_VERSION,
                        found = persisted.version,
                        "queue persistence version mismatch"
                    );
                }
                Ok(persisted.operations)
            }
            Ok(None) => Ok(Vec::new()),
            Err(SyncError::Decode(reason)) => {
                error!(%reason, "offline queue unreadable, starting with an empty queue");
                self.file.quarantine().await?;
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn save(&self, operations: &[PendingOperation]) -> SyncResult<()> {
        let persisted = PersistedQueue {
            version: PERSISTENCE_VERSION,
            saved_at: Utc::now(),
            operations: operations.to_vec(),
        };
        self.file.write(&persisted).await
    }
}
