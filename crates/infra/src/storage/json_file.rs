use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use stellar_core::{SyncError, SyncResult};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

/// One JSON record on disk, replaced atomically on every write
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Record stored at `<dir>/<key>.json`
    pub fn in_dir(dir: impl AsRef<Path>, key: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{key}.json")))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn checksum_path(&self) -> PathBuf {
        self.path.with_extension("sha256")
    }

    /// Read and decode the record; `None` when it does not exist
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read<T: DeserializeOwned>(&self) -> SyncResult<Option<T>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("record does not exist yet");
                return Ok(None);
            }
            Err(err) => return Err(InfraError::from(err).into()),
        };

        if self.sidecar_matches(&data).await == Some(false) {
            warn!("checksum mismatch, record may be corrupted");
        }

        serde_json::from_slice(&data).map(Some).map_err(|err| {
            SyncError::Decode(format!("{}: {err}", self.path.display()))
        })
    }

    /// Encode and replace the record
    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    pub async fn write<T: Serialize + ?Sized>(&self, value: &T) -> SyncResult<()> {
        let data = serde_json::to_vec_pretty(value)?;
        let checksum = calculate_checksum(&data);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(InfraError::from)?;
        file.write_all(&data).await.map_err(InfraError::from)?;
        file.sync_all().await.map_err(InfraError::from)?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(InfraError::from)?;

        if let Err(err) = fs::write(self.checksum_path(), checksum).await {
            warn!(error = %err, "failed to write checksum sidecar");
        }

        debug!(bytes = data.len(), "record persisted");
        Ok(())
    }

    /// Move an unreadable record aside so a fresh one can be written
    pub async fn quarantine(&self) -> SyncResult<PathBuf> {
        let target = self.path.with_extension(format!(
            "corrupt-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S")
        ));
        fs::rename(&self.path, &target).await.map_err(InfraError::from)?;
        if let Err(err) = fs::remove_file(self.checksum_path()).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %err, "failed to remove checksum sidecar");
            }
        }
        warn!(from = %self.path.display(), to = %target.display(), "quarantined corrupt record");
        Ok(target)
    }

    /// Compare `data` against the sidecar checksum; `None` without a sidecar
    async fn sidecar_matches(&self, data: &[u8]) -> Option<bool> {
        match fs::read_to_string(self.checksum_path()).await {
            Ok(expected) => Some(expected.trim() == calculate_checksum(data)),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %err, "failed to read checksum sidecar");
                }
                None
            }
        }
    }
}

fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn missing_record_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), "absent");
        assert_eq!(store.read::<serde_json::Value>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_creates_parent_and_sidecar() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::in_dir(dir.path().join("nested"), "record");

        store.write(&json!({"connected": true})).await.unwrap();

        assert!(store.path().exists());
        assert!(store.path().with_extension("sha256").exists());
        assert!(!store.path().with_extension("tmp").exists());
        let data = std::fs::read(store.path()).unwrap();
        assert_eq!(store.sidecar_matches(&data).await, Some(true));
        assert_eq!(
            store.read::<serde_json::Value>().await.unwrap(),
            Some(json!({"connected": true}))
        );
    }

    #[tokio::test]
    async fn tampered_record_fails_integrity_but_still_reads() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), "record");
        store.write(&json!([1, 2])).await.unwrap();

        std::fs::write(store.path(), b"[1,2,3]").unwrap();

        assert_eq!(store.sidecar_matches(b"[1,2,3]").await, Some(false));
        assert_eq!(store.read::<Vec<u8>>().await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn garbage_is_decode_error_and_can_be_quarantined() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), "record");
        std::fs::write(store.path(), b"{not json").unwrap();

        let err = store.read::<serde_json::Value>().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));

        let moved = store.quarantine().await.unwrap();
        assert!(moved.exists());
        assert_eq!(store.sidecar_matches(b"{not json").await, None);
        assert_eq!(store.read::<serde_json::Value>().await.unwrap(), None);
    }
}
