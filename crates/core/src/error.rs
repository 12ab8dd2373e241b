//! Sync-specific error types
//!
//! Provides error classification for sync operations with retry metadata.

use std::time::Duration;

use stellar_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use stellar_common::{impl_error_classification, impl_error_conversion};
use stellar_domain::StellarError;
use thiserror::Error;

/// Categories of sync errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// Server answered 429 or client-side admission denied the call
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except 429)
    Client,
    /// No response obtainable
    Network,
    /// Response arrived but could not be decoded
    Decode,
    /// Queue or connectivity persistence failed
    Storage,
    /// Configuration or wiring errors
    Config,
}

/// Sync operation errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Store rate limited on the client")]
    RateLimited,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

impl_error_conversion!(SyncError, Common);

impl_error_classification!(SyncError, Common,
    Self::Network(_) | Self::Timeout(_) => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Http { status } => {
        retryable: *status == 429 || *status >= 500,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::RateLimited => {
        retryable: true,
        severity: ErrorSeverity::Info,
        critical: false,
        retry_after: Some(Duration::from_secs(1)),
    },
    Self::Decode(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Storage(_) => {
        retryable: true,
        severity: ErrorSeverity::Error,
        critical: true,
    },
    Self::Scheduler(_) | Self::Config(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
);

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => SyncErrorCategory::Network,
            Self::Http { status: 429 } | Self::RateLimited => SyncErrorCategory::RateLimit,
            Self::Http { status } if *status >= 500 => SyncErrorCategory::Server,
            Self::Http { .. } => SyncErrorCategory::Client,
            Self::Decode(_) => SyncErrorCategory::Decode,
            Self::Storage(_) => SyncErrorCategory::Storage,
            Self::Scheduler(_) | Self::Config(_) => SyncErrorCategory::Config,
            Self::Common(common) => match common {
                CommonError::Persistence { .. } => SyncErrorCategory::Storage,
                CommonError::Serialization { .. } => SyncErrorCategory::Decode,
                CommonError::RateLimitExceeded { .. } => SyncErrorCategory::RateLimit,
                CommonError::Timeout { .. } => SyncErrorCategory::Network,
                CommonError::Config { .. } | CommonError::Internal(_) => SyncErrorCategory::Config,
            },
        }
    }

    /// The request never reached a successful response: unreachable,
    /// timed out or answered with a non-2xx status
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_) | Self::Http { .. })
    }

    /// HTTP status of a terminal server response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<StellarError> for SyncError {
    fn from(err: StellarError) -> Self {
        match err {
            StellarError::Config(message) => Self::Config(message),
            StellarError::Storage(message) => Self::Storage(message),
            StellarError::Network(message) => Self::Network(message),
            StellarError::Serialization(message) => Self::Decode(message),
            StellarError::InvalidInput(message) | StellarError::Internal(message) => {
                Self::Config(message)
            }
        }
    }
}

impl From<SyncError> for StellarError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Config(message) => Self::Config(message),
            SyncError::Storage(message) => Self::Storage(message),
            SyncError::Decode(message) => Self::Serialization(message),
            SyncError::Network(_) | SyncError::Timeout(_) | SyncError::Http { .. } => {
                Self::Network(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_categories() {
        assert_eq!(SyncError::Http { status: 429 }.category(), SyncErrorCategory::RateLimit);
        assert_eq!(SyncError::Http { status: 503 }.category(), SyncErrorCategory::Server);
        assert_eq!(SyncError::Http { status: 404 }.category(), SyncErrorCategory::Client);
        assert_eq!(SyncError::Http { status: 404 }.status(), Some(404));
    }

    #[test]
    fn retryability() {
        assert!(SyncError::Network("refused".into()).is_retryable());
        assert!(SyncError::Timeout(Duration::from_secs(3)).is_retryable());
        assert!(SyncError::Http { status: 500 }.is_retryable());
        assert!(!SyncError::Http { status: 400 }.is_retryable());
        assert!(!SyncError::Decode("eof".into()).is_retryable());
        assert_eq!(SyncError::RateLimited.retry_after(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn only_transport_and_status_failures_are_delivery_failures() {
        assert!(SyncError::Network("refused".into()).is_delivery_failure());
        assert!(SyncError::Timeout(Duration::from_secs(10)).is_delivery_failure());
        assert!(SyncError::Http { status: 503 }.is_delivery_failure());
        assert!(!SyncError::Decode("eof".into()).is_delivery_failure());
        assert!(!SyncError::RateLimited.is_delivery_failure());
    }

    #[test]
    fn common_errors_keep_their_classification() {
        let err = SyncError::from(CommonError::persistence_op("save", "disk full"));
        assert_eq!(err.category(), SyncErrorCategory::Storage);
        assert_eq!(err.is_retryable(), CommonError::persistence("x").is_retryable());
    }

    #[test]
    fn json_errors_are_decode_failures() {
        let parse = serde_json::from_str::<u8>("[").unwrap_err();
        assert_eq!(SyncError::from(parse).category(), SyncErrorCategory::Decode);
    }

    #[test]
    fn domain_errors_map_by_kind() {
        let err = SyncError::from(StellarError::Storage("locked".into()));
        assert!(matches!(err, SyncError::Storage(_)));
        assert!(err.is_critical());
    }

    #[test]
    fn sync_errors_surface_as_domain_errors() {
        assert!(matches!(
            StellarError::from(SyncError::Config("bad url".into())),
            StellarError::Config(_)
        ));
        assert!(matches!(
            StellarError::from(SyncError::Http { status: 502 }),
            StellarError::Network(_)
        ));
        assert!(matches!(
            StellarError::from(SyncError::Scheduler("no runtime".into())),
            StellarError::Internal(_)
        ));
    }
}
