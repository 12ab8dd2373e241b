//! Conversions from external infrastructure errors into sync errors.

use std::io::{Error as IoError, ErrorKind};

use reqwest::Error as HttpError;
use stellar_core::SyncError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the core error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSyncError {
    fn into_sync(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return SyncError::Http { status: status.as_u16() };
        }

        if self.is_builder() {
            return SyncError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return SyncError::Decode(self.to_string());
        }

        SyncError::Network(format!("HTTP error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for IoError {
    fn into_sync(self) -> SyncError {
        match self.kind() {
            ErrorKind::PermissionDenied => {
                SyncError::Storage(format!("permission denied: {self}"))
            }
            ErrorKind::NotFound => SyncError::Storage(format!("path not found: {self}")),
            _ => SyncError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_sync())
    }
}
