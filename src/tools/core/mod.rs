// Tool invocation core: the contract every tool obeys.
pub mod dyn_tool;
pub mod invocation;
pub mod registry;
pub mod spec;
pub mod tool;

pub use dyn_tool::DynTool;
pub use invocation::{invoke, Invocation};
pub use registry::{ToolDefinition, ToolRegistry};
pub use spec::{OutputMode, ToolSpec};
pub use tool::Tool;
