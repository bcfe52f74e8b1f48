mod cli;
mod config;
mod logging;
mod mcp;
mod services;
mod tools;
mod utils;

use anyhow::Result;
use cli::Args;
use config::ModuleFilter;
use mcp::{McpServer, MessageHandler};
use services::ServiceRegistry;
use tools::core::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    logging::setup_logging(args.verbose);

    let filter = ModuleFilter::from_cli_and_env(args.include.as_deref(), args.exclude.as_deref())?;
    let registry = ToolRegistry::with_enabled_modules(&filter);
    let handler = MessageHandler::new(registry, ServiceRegistry::new());

    McpServer::new(handler).run().await
}
