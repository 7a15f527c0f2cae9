//! Newline-delimited JSON-RPC over stdin/stdout

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::{McpHandler, McpServer};

/// Serve requests from stdin until EOF
pub async fn run_stdio<H: McpHandler>(server: &McpServer<H>) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve_lines(server, reader, writer).await
}

/// One request (or batch) per line in, one response line out. Lines that
/// only carry notifications produce no output.
pub async fn serve_lines<H, R, W>(server: &McpServer<H>, reader: R, mut writer: W) -> Result<()>
where
    H: McpHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(body) = server.handle_str(trimmed).await.to_json() {
            let mut text = serde_json::to_string(&body)?;
            text.push('\n');
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    tracing::debug!("stdin closed, stopping stdio transport");
    Ok(())
}
