use crate::mcp::handler::MessageHandler;
use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Stdio JSON-RPC server: one newline-delimited message per line on stdin,
/// responses on stdout. Logging goes to stderr so stdout stays clean for
/// the protocol.
pub struct McpServer {
    handler: MessageHandler,
}

impl McpServer {
    pub fn new(handler: MessageHandler) -> Self {
        Self { handler }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Starting MCP server using stdio transport");

        let stdin = stdin();
        let mut reader = BufReader::new(stdin);

        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break; // EOF
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            debug!("Received message: {}", message);
            self.handler.handle_message(message).await?;
        }

        info!("MCP server shutting down");
        Ok(())
    }
}
