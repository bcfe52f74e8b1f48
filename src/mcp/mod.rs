pub mod handler;
pub mod server;
pub mod types;

pub use handler::MessageHandler;
pub use server::McpServer;
