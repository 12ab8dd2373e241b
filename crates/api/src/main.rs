//! stellar-syncd - sync daemon for the Stellar memory server
//!
//! Reads JSON-line commands on stdin and answers on stdout while the
//! connectivity monitor replays offline writes in the background.

use std::time::Duration;

use anyhow::Context;
use stellar_app::utils::logging::{init_tracing, LogFormat};
use stellar_app::{serve_lines, SyncContext};
use tokio::io::BufReader;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before logging so RUST_LOG and STELLAR_LOG_FORMAT apply
    let dotenv = dotenvy::dotenv();

    init_tracing(LogFormat::from_env())?;
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env loaded"),
    }

    let context = SyncContext::new().context("failed to build sync context")?;
    let startup = context.spawn_start();

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        served = serve_lines(context.service.as_ref(), stdin, stdout) => {
            served.context("command loop failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("interrupt received");
        }
    }

    if !startup.is_finished() {
        startup.abort();
    }
    match startup.await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "connectivity monitor failed to start"),
        Err(err) if err.is_cancelled() => tracing::debug!("startup check abandoned"),
        Err(err) => tracing::error!(error = %err, "startup task panicked"),
    }

    context.shutdown(SHUTDOWN_TIMEOUT).await?;
    tracing::info!("stellar-syncd stopped");
    Ok(())
}
