//! Tracing subscriber setup
//!
//! Output goes to stderr; stdout carries command responses.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Selects JSON log lines when set to `json`
pub const LOG_FORMAT_ENV: &str = "STELLAR_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Read [`LOG_FORMAT_ENV`]; anything but `json` means human-readable
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` drives the filter, defaulting to `info`. Calling this twice
/// leaves the first subscriber in place and returns an error.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
