use anyhow::Result;
use serde_json::Value;

use super::spec::{OutputMode, ToolSpec};
use super::tool::Tool;
use crate::services::ServiceRegistry;

/// Type-erased tool interface for storing heterogeneous tools in the
/// registry.
#[async_trait::async_trait]
pub trait DynTool: Send + Sync + 'static {
    /// Get the static metadata for this tool
    fn spec(&self) -> ToolSpec;

    /// How the successful payload is delivered
    fn output_mode(&self) -> OutputMode;

    /// Invoke the tool with JSON arguments and get the raw string payload
    async fn call(&self, services: &ServiceRegistry, args: Value) -> Result<String>;
}

/// Automatic implementation of DynTool for any type that implements Tool
#[async_trait::async_trait]
impl<T: Tool> DynTool for T {
    fn spec(&self) -> ToolSpec {
        Tool::spec(self)
    }

    fn output_mode(&self) -> OutputMode {
        Tool::output_mode(self)
    }

    async fn call(&self, services: &ServiceRegistry, args: Value) -> Result<String> {
        let input: T::Input = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("Invalid parameters: {e}"))?;
        self.execute(services, input).await
    }
}
