use anyhow::Result;
use serde_json::Value;

use super::dyn_tool::DynTool;
use super::spec::OutputMode;
use crate::services::ServiceRegistry;
use crate::utils::spool;

/// The result envelope of a single tool invocation. One of these is always
/// produced; no error crosses this boundary as anything but `is_error: true`
/// with the error's message as content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub text: String,
    pub is_error: bool,
}

/// Run a tool to completion.
///
/// This is the single chokepoint for failures: argument deserialization,
/// the handler itself, and output spooling all funnel through the same
/// error-to-envelope conversion.
pub async fn invoke(tool: &dyn DynTool, services: &ServiceRegistry, args: Value) -> Invocation {
    let shaped = match tool.call(services, args).await {
        Ok(payload) => shape_output(tool.output_mode(), payload),
        Err(e) => Err(e),
    };

    match shaped {
        Ok(text) => Invocation {
            text,
            is_error: false,
        },
        Err(e) => Invocation {
            text: e.to_string(),
            is_error: true,
        },
    }
}

/// Apply the tool's output policy to a successful payload: pass it through
/// inline, or spool it to a temp file and substitute the path.
fn shape_output(mode: OutputMode, payload: String) -> Result<String> {
    match mode {
        OutputMode::Inline => Ok(payload),
        OutputMode::Spooled {
            module_ref,
            tool_ref,
        } => {
            let path = spool::write_temporary_text_output(module_ref, tool_ref, &payload)?;
            Ok(path.display().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::spec::ToolSpec;
    use crate::tools::core::tool::Tool;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoInput {
        message: String,
    }

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        type Input = EchoInput;

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo",
                description: "Echoes back the input message.",
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" }
                    },
                    "required": ["message"]
                }),
            }
        }

        async fn execute(
            &self,
            _services: &ServiceRegistry,
            input: Self::Input,
        ) -> Result<String> {
            Ok(input.message)
        }
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        type Input = serde_json::Value;

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "failing",
                description: "Always fails.",
                parameters_schema: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn execute(
            &self,
            _services: &ServiceRegistry,
            _input: Self::Input,
        ) -> Result<String> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    struct SpooledEchoTool;

    #[async_trait::async_trait]
    impl Tool for SpooledEchoTool {
        type Input = EchoInput;

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "spooled_echo",
                description: "Echoes via a temp file.",
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" }
                    },
                    "required": ["message"]
                }),
            }
        }

        fn output_mode(&self) -> OutputMode {
            OutputMode::Spooled {
                module_ref: "test",
                tool_ref: "spooled-echo",
            }
        }

        async fn execute(
            &self,
            _services: &ServiceRegistry,
            input: Self::Input,
        ) -> Result<String> {
            Ok(input.message)
        }
    }

    #[tokio::test]
    async fn test_inline_success_passes_payload_through() {
        let services = ServiceRegistry::new();
        let result = invoke(&EchoTool, &services, json!({"message": "hello"})).await;
        assert!(!result.is_error);
        assert_eq!(result.text, "hello");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_error_envelope() {
        let services = ServiceRegistry::new();
        let result = invoke(&FailingTool, &services, json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.text, "boom");
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_error_envelope() {
        let services = ServiceRegistry::new();
        let result = invoke(&EchoTool, &services, json!({"message": 42})).await;
        assert!(result.is_error);
        assert!(result.text.contains("Invalid parameters"));
    }

    #[tokio::test]
    async fn test_spooled_output_returns_readable_path() {
        let services = ServiceRegistry::new();
        let first = invoke(&SpooledEchoTool, &services, json!({"message": "{\"a\":1}"})).await;
        let second = invoke(&SpooledEchoTool, &services, json!({"message": "{\"a\":1}"})).await;

        assert!(!first.is_error);
        assert!(!second.is_error);
        assert_ne!(first.text, second.text);
        assert_eq!(std::fs::read_to_string(&first.text).unwrap(), "{\"a\":1}");
        assert_eq!(std::fs::read_to_string(&second.text).unwrap(), "{\"a\":1}");
    }
}
