pub mod env;
pub mod error;
pub mod github;
pub mod jira;
pub mod n8n;
pub mod pocketbase;
pub mod quip;
pub mod registry;
pub mod replicate;
pub mod slack;
pub mod telegram;

pub use error::ApiError;
pub use registry::ServiceRegistry;
