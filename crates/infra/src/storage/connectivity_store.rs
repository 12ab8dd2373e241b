use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stellar_core::{ConnectivityStore, SyncError, SyncResult};
use stellar_domain::constants::CONNECTIVITY_STORAGE_KEY;
use tracing::warn;

use super::json_file::JsonFileStore;

#[derive(Debug, Serialize, Deserialize)]
struct ConnectivityRecord {
    connected: Option<bool>,
}

/// Connectivity flag persisted as `stellar_connectivity.json`
#[derive(Debug, Clone)]
pub struct FileConnectivityStore {
    file: JsonFileStore,
}

impl FileConnectivityStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { file: JsonFileStore::in_dir(data_dir, CONNECTIVITY_STORAGE_KEY) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl ConnectivityStore for FileConnectivityStore {
    async fn load(&self) -> SyncResult<Option<bool>> {
        match self.file.read::<ConnectivityRecord>().await {
            Ok(record) => Ok(record.and_then(|r| r.connected)),
            Err(SyncError::Decode(reason)) => {
                warn!(%reason, "connectivity record unreadable, treating as unknown");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn save(&self, connected: bool) -> SyncResult<()> {
        self.file.write(&ConnectivityRecord { connected: Some(connected) }).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn unknown_until_saved() {
        let dir = TempDir::new().unwrap();
        let store = FileConnectivityStore::new(dir.path());

        assert_eq!(store.load().await.unwrap(), None);
        store.save(false).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(false));
        store.save(true).await.unwrap();
        assert_eq!(FileConnectivityStore::new(dir.path()).load().await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn garbage_reads_as_unknown() {
        let dir = TempDir::new().unwrap();
        let store = FileConnectivityStore::new(dir.path());
        std::fs::write(store.path(), b"connected").unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }
}
