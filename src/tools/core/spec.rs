/// Specification for a tool, including metadata shown to the calling agent.
#[derive(Clone)]
pub struct ToolSpec {
    /// Unique name of the tool
    pub name: &'static str,
    /// Detailed description of what the tool does
    pub description: &'static str,
    /// JSON Schema for the tool's parameters
    pub parameters_schema: serde_json::Value,
}

/// How a tool's successful payload is delivered to the caller.
///
/// Fixed per tool at registration time: short confirmations go inline, while
/// tools that dump whole documents spool to a temp file and return the path,
/// bounding the response size the protocol has to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The handler's string becomes the result content directly.
    Inline,
    /// The handler's string is written to a temp file; the path is returned.
    Spooled {
        module_ref: &'static str,
        tool_ref: &'static str,
    },
}
