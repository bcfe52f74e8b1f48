use super::types::*;
use crate::services::ServiceRegistry;
use crate::tools::core::{invoke, ToolRegistry};
use crate::utils::{MessageWriter, StdoutWriter};
use anyhow::Result;
use tracing::{debug, error, trace};

pub struct MessageHandler {
    registry: ToolRegistry,
    services: ServiceRegistry,
    message_writer: Box<dyn MessageWriter>,
}

impl MessageHandler {
    pub fn new(registry: ToolRegistry, services: ServiceRegistry) -> Self {
        Self {
            registry,
            services,
            message_writer: Box::new(StdoutWriter::new(tokio::io::stdout())),
        }
    }

    #[cfg(test)]
    pub fn with_writer(
        registry: ToolRegistry,
        services: ServiceRegistry,
        message_writer: Box<dyn MessageWriter>,
    ) -> Self {
        Self {
            registry,
            services,
            message_writer,
        }
    }

    /// Sends a JSON-RPC response
    async fn send_response<T: serde::Serialize>(&mut self, id: RequestId, result: T) -> Result<()> {
        let response = JSONRPCResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result,
        };
        self.send_message(&serde_json::to_value(response)?).await
    }

    /// Sends a JSON-RPC error response
    async fn send_error(
        &mut self,
        id: RequestId,
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    ) -> Result<()> {
        let error = JSONRPCError {
            jsonrpc: "2.0".to_string(),
            id,
            error: ErrorObject {
                code,
                message,
                data,
            },
        };
        self.send_message(&serde_json::to_value(error)?).await
    }

    async fn send_message(&mut self, message: &serde_json::Value) -> Result<()> {
        let message_str = serde_json::to_string(message)?;
        debug!("Sending message: {}", message_str);
        self.message_writer.write_message(&message_str).await
    }

    /// Handle initialize request
    async fn handle_initialize(&mut self, id: RequestId, params: InitializeParams) -> Result<()> {
        debug!("Initialize params: {:?}", params);

        self.send_response(
            id,
            InitializeResult {
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: Some(false),
                    }),
                    experimental: None,
                },
                protocol_version: params.protocol_version,
                server_info: Implementation {
                    name: "toolbridge".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(
                    "Exposes GitHub, Jira, Quip, n8n, PocketBase, Replicate, Slack, and \
                     Telegram operations as tools. Large results are written to temp files \
                     and returned as file paths."
                        .to_string(),
                ),
            },
        )
        .await
    }

    /// Handle tools/list request
    async fn handle_tools_list(&mut self, id: RequestId) -> Result<()> {
        trace!("Handling tools/list request");

        let tools_json = self
            .registry
            .definitions()
            .iter()
            .map(|definition| {
                serde_json::json!({
                    "name": definition.name,
                    "description": definition.description,
                    "inputSchema": definition.parameters,
                })
            })
            .collect();

        self.send_response(
            id,
            ListToolsResult {
                tools: tools_json,
                next_cursor: None,
            },
        )
        .await
    }

    /// Handle tools/call request
    ///
    /// A known tool always answers with a result envelope; the invocation
    /// layer converts every failure below it into `isError: true`. Only an
    /// unknown tool name is a protocol-level error.
    async fn handle_tool_call(&mut self, id: RequestId, params: ToolCallParams) -> Result<()> {
        debug!("Handling tool call for {}", params.name);

        let args = params.arguments.unwrap_or_else(|| serde_json::json!({}));
        let invocation = match self.registry.get(&params.name) {
            Some(tool) => Some(invoke(tool, &self.services, args).await),
            None => None,
        };

        match invocation {
            Some(invocation) => {
                self.send_response(
                    id,
                    ToolCallResult {
                        content: vec![ToolResultContent::Text {
                            text: invocation.text,
                        }],
                        is_error: invocation.is_error,
                    },
                )
                .await
            }
            None => {
                self.send_error(id, -32602, format!("Tool not found: {}", params.name), None)
                    .await
            }
        }
    }

    /// Handle prompts/list request
    async fn handle_prompts_list(&mut self, id: RequestId) -> Result<()> {
        trace!("Handling prompts/list request");
        self.send_response(
            id,
            ListPromptsResult {
                prompts: vec![],
                next_cursor: None,
            },
        )
        .await
    }

    /// Main message handling entry point
    pub async fn handle_message(&mut self, message: &str) -> Result<()> {
        // Parse the message first
        let message: JSONRPCMessage = match serde_json::from_str(message) {
            Ok(msg) => msg,
            Err(e) => {
                error!("Invalid JSON-RPC message: {}", e);
                return Ok(());
            }
        };

        match message {
            JSONRPCMessage::Request {
                method, id, params, ..
            } => {
                trace!("Processing request: method={}, id={:?}", method, id);
                match method.as_str() {
                    "initialize" => {
                        let params: InitializeParams =
                            serde_json::from_value(params.unwrap_or_default())?;
                        self.handle_initialize(id, params).await?;
                    }

                    "tools/list" => {
                        self.handle_tools_list(id).await?;
                    }

                    "tools/call" => {
                        match serde_json::from_value::<ToolCallParams>(params.unwrap_or_default()) {
                            Ok(params) => {
                                self.handle_tool_call(id, params).await?;
                            }
                            Err(e) => {
                                self.send_response(
                                    id,
                                    ToolCallResult {
                                        content: vec![ToolResultContent::Text {
                                            text: format!("Invalid tool parameters: {e}"),
                                        }],
                                        is_error: true,
                                    },
                                )
                                .await?;
                            }
                        }
                    }

                    "prompts/list" => {
                        self.handle_prompts_list(id).await?;
                    }

                    method => {
                        self.send_error(id, -32601, format!("Method not found: {method}"), None)
                            .await?;
                    }
                }
            }

            JSONRPCMessage::Notification { method, params, .. } => match method.as_str() {
                "notifications/initialized" => {
                    if let Some(params) = params {
                        debug!("Client initialized with params: {:?}", params);
                    } else {
                        debug!("Client initialized");
                    }
                }
                _ => {
                    debug!("Unknown notification: {}", method);
                }
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleFilter;
    use crate::utils::MockWriter;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn handler_with_writer() -> (Arc<Mutex<Vec<String>>>, MessageHandler) {
        let registry = ToolRegistry::with_enabled_modules(&ModuleFilter::All);
        let services = ServiceRegistry::new();
        let writer = MockWriter::new();
        let messages = writer.messages.clone();
        let handler = MessageHandler::with_writer(registry, services, Box::new(writer));
        (messages, handler)
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let (messages, mut handler) = handler_with_writer();
        let message = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "capabilities": {"tools": null},
                "clientInfo": {"name": "test-client", "version": "0.0.1"},
                "protocolVersion": "2024-11-05"
            }
        }"#;

        handler.handle_message(message).await.unwrap();

        let messages = messages.lock().await;
        assert_eq!(messages.len(), 1);
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(response["result"]["serverInfo"]["name"], "toolbridge");
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_tools_list_contains_registered_tools() {
        let (messages, mut handler) = handler_with_writer();
        let message = r#"{"jsonrpc": "2.0", "id": 2, "method": "tools/list"}"#;

        handler.handle_message(message).await.unwrap();

        let messages = messages.lock().await;
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert!(tools.iter().any(|t| t["name"] == "github_get_pull_request"));
        assert!(tools.iter().any(|t| t["name"] == "slack_send_message"));
        assert!(tools
            .iter()
            .all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_tools_list_respects_module_filter() {
        let registry =
            ToolRegistry::with_enabled_modules(&ModuleFilter::Include(vec!["jira".to_string()]));
        let services = ServiceRegistry::new();
        let writer = MockWriter::new();
        let messages = writer.messages.clone();
        let mut handler = MessageHandler::with_writer(registry, services, Box::new(writer));

        handler
            .handle_message(r#"{"jsonrpc": "2.0", "id": 3, "method": "tools/list"}"#)
            .await
            .unwrap();

        let messages = messages.lock().await;
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().all(|t| t["name"]
            .as_str()
            .unwrap()
            .starts_with("jira_")));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let (messages, mut handler) = handler_with_writer();
        let message = r#"{
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "no_such_tool", "arguments": {}}
        }"#;

        handler.handle_message(message).await.unwrap();

        let messages = messages.lock().await;
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(response["error"]["code"], -32602);
        assert!(response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("no_such_tool"));
    }

    #[tokio::test]
    async fn test_failing_tool_call_yields_error_envelope() {
        // Without Slack credentials in the environment, the tool fails at
        // façade construction; the failure must arrive as an isError result,
        // not a protocol error.
        std::env::remove_var("SLACK_API_TOKEN");

        let (messages, mut handler) = handler_with_writer();
        let message = r#"{
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "slack_get_user", "arguments": {"userId": "U01"}}
        }"#;

        handler.handle_message(message).await.unwrap();

        let messages = messages.lock().await;
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("SLACK_API_TOKEN"));
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let (messages, mut handler) = handler_with_writer();
        handler
            .handle_message(r#"{"jsonrpc": "2.0", "id": 6, "method": "bogus/method"}"#)
            .await
            .unwrap();

        let messages = messages.lock().await;
        let response: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_notifications_produce_no_response() {
        let (messages, mut handler) = handler_with_writer();
        handler
            .handle_message(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
            .await
            .unwrap();

        assert!(messages.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_skipped() {
        let (messages, mut handler) = handler_with_writer();
        handler.handle_message("this is not json").await.unwrap();
        assert!(messages.lock().await.is_empty());
    }
}
