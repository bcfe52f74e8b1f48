use anyhow::Result;
use serde::de::DeserializeOwned;

use super::spec::{OutputMode, ToolSpec};
use crate::services::ServiceRegistry;

/// Core trait for tools.
///
/// A tool handler is a plain async function from typed input to a string
/// payload (or an error). Argument deserialization, error trapping, and
/// output shaping are layered on top by the invocation machinery, so
/// implementations stay thin wrappers around one service call each.
#[async_trait::async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Input type for this tool, must be deserializable from JSON
    type Input: DeserializeOwned + Send;

    /// Get the metadata for this tool
    fn spec(&self) -> ToolSpec;

    /// How the successful payload is delivered. Defaults to inline.
    fn output_mode(&self) -> OutputMode {
        OutputMode::Inline
    }

    /// Execute the tool against the given services.
    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String>;
}
