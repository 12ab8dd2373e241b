//! JSON-lines command loop
//!
//! Each input line is one message such as `{"type":"STORE","payload":{...}}`
//! and produces exactly one response line, in order. Blank lines are
//! skipped. The loop ends at EOF.

use stellar_common::Clock;
use stellar_core::{dispatch_raw, SyncService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument};

/// Serve commands from `reader`, writing responses to `writer`
///
/// Returns the number of messages answered.
#[instrument(skip_all)]
pub async fn serve_lines<C, R, W>(
    service: &SyncService<C>,
    reader: R,
    mut writer: W,
) -> std::io::Result<usize>
where
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let response = dispatch_raw(service, message).await;
        let mut encoded = response.to_string();
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;

        answered += 1;
        debug!(answered, "response written");
    }

    info!(answered, "command input closed");
    Ok(answered)
}
