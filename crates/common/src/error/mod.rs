//! Shared error foundation
//!
//! [`CommonError`] holds the failures that the resilience primitives and the
//! adapters have in common. Each layer wraps it in its own enum and derives
//! conversions and classification through the two macros below:
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum TransportError {
//!     #[error("connection refused: {0}")]
//!     Refused(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_conversion!(TransportError, Common);
//! impl_error_classification!(TransportError, Common,
//!     Self::Refused(_) => { retryable: true, severity: ErrorSeverity::Warning, critical: false }
//! );
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias for foundation operations
pub type CommonResult<T> = Result<T, CommonError>;

/// Failures shared by every layer of the sync client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// A setting is missing or out of range
    #[error("invalid configuration{}: {message}", field_suffix(.field))]
    Config { field: Option<String>, message: String },

    /// A record could not be encoded or decoded
    #[error("{format} encoding failed: {message}")]
    Serialization { format: &'static str, message: String },

    /// Reading or writing a persisted record failed
    #[error("persistence failed{}: {message}", field_suffix(.operation))]
    Persistence { operation: Option<String>, message: String },

    /// Client-side admission denied the call
    #[error("more than {limit} calls within {window:?}")]
    RateLimitExceeded { limit: usize, window: Duration },

    /// An operation ran past its deadline
    #[error("{operation} did not finish within {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// A broken invariant
    #[error("internal error: {0}")]
    Internal(String),
}

fn field_suffix(name: &Option<String>) -> String {
    name.as_deref().map(|name| format!(" ({name})")).unwrap_or_default()
}

impl CommonError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { field: None, message: message.into() }
    }

    pub fn config_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config { field: Some(field.into()), message: message.into() }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence { operation: None, message: message.into() }
    }

    pub fn persistence_op(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence { operation: Some(operation.into()), message: message.into() }
    }

    pub fn rate_limit(limit: usize, window: Duration) -> Self {
        Self::RateLimitExceeded { limit, window }
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Stable label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::Persistence { .. } => "persistence",
            Self::RateLimitExceeded { .. } => "rate_limit",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. } | Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RateLimitExceeded { .. } => ErrorSeverity::Info,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Config { .. } | Self::Serialization { .. } | Self::Persistence { .. } => {
                ErrorSeverity::Error
            }
            Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { window, .. } => Some(*window),
            _ => None,
        }
    }
}

/// Retryability and severity, used to pick between "queue for later" and
/// "give up" and to choose a log level
pub trait ErrorClassification {
    /// Transient failure that may succeed if repeated
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    /// The process state itself is suspect
    fn is_critical(&self) -> bool;

    /// Suggested wait before repeating, if known
    fn retry_after(&self) -> Option<Duration>;
}

/// Ordered severity scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization { format: "json", message: err.to_string() }
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization { format: "toml", message: err.to_string() }
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence { operation: None, message: err.to_string() }
    }
}

/// Route `serde_json` and `std::io` errors through the `CommonError` variant
/// of a layer's error enum
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Implement [`ErrorClassification`] for a layer's error enum
///
/// The `CommonError` variant delegates; every other variant lists its
/// classification inline. `retry_after` is optional per arm.
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(, retry_after: $retry_after:expr)?
                $(,)?
            }
        )*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(inner) => inner.is_retryable(),
                    $($variant => $retryable,)*
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(inner) => inner.severity(),
                    $($variant => $severity,)*
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    Self::$common_variant(inner) => inner.is_critical(),
                    $($variant => $critical,)*
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    Self::$common_variant(inner) => inner.retry_after(),
                    $($($variant => $retry_after,)?)*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}
