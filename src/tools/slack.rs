//! Slack conversation, user, and file tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(GetConversationHistoryTool),
        Box::new(GetThreadRepliesTool),
        Box::new(GetUserTool),
        Box::new(ListChannelsTool),
        Box::new(SendMessageTool),
        Box::new(UpdateMessageTool),
        Box::new(AddReactionTool),
        Box::new(UploadFileTool),
        Box::new(DownloadFileTool),
    ]
}

fn spooled(tool_ref: &'static str) -> OutputMode {
    OutputMode::Spooled {
        module_ref: "slack",
        tool_ref,
    }
}

fn default_history_limit() -> u64 {
    25
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConversationHistoryInput {
    pub conversation_id: String,
    #[serde(default = "default_history_limit")]
    pub limit: u64,
    pub cursor: Option<String>,
}

pub struct GetConversationHistoryTool;

#[async_trait::async_trait]
impl Tool for GetConversationHistoryTool {
    type Input = GetConversationHistoryInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_get_conversation_history",
            description: "Get recent messages from a Slack channel or DM. Thread replies are \
                not included; use slack_get_thread_replies with a message's ts for those. \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "conversationId": {
                        "type": "string",
                        "description": "The ID of the channel or DM. Example: 'C01ABC123'"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 1000,
                        "default": 25,
                        "description": "Maximum number of messages to return."
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor from a previous response (response_metadata.next_cursor)."
                    }
                },
                "required": ["conversationId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-conversation-history")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        let result = slack
            .get_conversation_history(&input.conversation_id, input.limit, input.cursor.as_deref())
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetThreadRepliesInput {
    pub conversation_id: String,
    pub thread_ts: String,
    #[serde(default = "default_history_limit")]
    pub limit: u64,
    pub cursor: Option<String>,
}

pub struct GetThreadRepliesTool;

#[async_trait::async_trait]
impl Tool for GetThreadRepliesTool {
    type Input = GetThreadRepliesInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_get_thread_replies",
            description: "Get the replies of a Slack thread, identified by the channel and the \
                parent message's timestamp. Results are written to a temporary file as JSON and \
                the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "conversationId": {
                        "type": "string",
                        "description": "The ID of the channel holding the thread. Example: 'C01ABC123'"
                    },
                    "threadTs": {
                        "type": "string",
                        "description": "The timestamp of the thread's parent message. Example: '1234567890.123456'"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 1000,
                        "default": 25,
                        "description": "Maximum number of replies to return."
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor from a previous response."
                    }
                },
                "required": ["conversationId", "threadTs"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-thread-replies")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        let result = slack
            .get_conversation_replies(
                &input.conversation_id,
                &input.thread_ts,
                input.limit,
                input.cursor.as_deref(),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserInput {
    pub user_id: String,
}

pub struct GetUserTool;

#[async_trait::async_trait]
impl Tool for GetUserTool {
    type Input = GetUserInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_get_user",
            description: "Get a Slack user's profile by user ID (e.g. to resolve the author of \
                a message). Results are written to a temporary file as JSON and the file path \
                is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "userId": {
                        "type": "string",
                        "description": "The ID of the user. Example: 'U01ABC123'"
                    }
                },
                "required": ["userId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-user")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        Ok(serde_json::to_string_pretty(&slack.get_user(&input.user_id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChannelsInput {
    #[serde(default = "default_channels_limit")]
    pub limit: u64,
    pub cursor: Option<String>,
}

fn default_channels_limit() -> u64 {
    100
}

pub struct ListChannelsTool;

#[async_trait::async_trait]
impl Tool for ListChannelsTool {
    type Input = ListChannelsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_list_channels",
            description: "List public and private Slack channels the bot can see. Results are \
                written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 1000,
                        "default": 100,
                        "description": "Maximum number of channels to return."
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor from a previous response."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-channels")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        let result = slack
            .list_channels(input.limit, input.cursor.as_deref())
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    pub channel: String,
    pub text: Option<String>,
    pub text_file: Option<String>,
    pub thread_ts: Option<String>,
}

pub struct SendMessageTool;

#[async_trait::async_trait]
impl Tool for SendMessageTool {
    type Input = SendMessageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_send_message",
            description: "Send a message to a Slack channel or as a thread reply. Returns the \
                message timestamp (ts) which can be used for threading. Use threadTs to reply \
                in an existing thread; use slack_update_message to edit a sent message.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "The ID of the Slack channel to send the message to. Example: 'C01ABC123'"
                    },
                    "text": {
                        "type": "string",
                        "description": "The message text to send. Supports Slack mrkdwn formatting."
                    },
                    "textFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the message text. Use this for large messages instead of 'text'."
                    },
                    "threadTs": {
                        "type": "string",
                        "description": "Timestamp of the parent message to reply in thread. Example: '1234567890.123456'"
                    }
                },
                "required": ["channel"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.text.as_deref(), input.text_file.as_deref(), "text")?;

        let slack = services.slack().await?;
        let result = slack
            .post_message(&input.channel, &text, input.thread_ts.as_deref())
            .await?;

        Ok(serde_json::to_string_pretty(&json!({
            "ok": result["ok"],
            "ts": result["ts"],
            "channel": result["channel"],
        }))?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageInput {
    pub channel: String,
    pub ts: String,
    pub text: Option<String>,
    pub text_file: Option<String>,
}

pub struct UpdateMessageTool;

#[async_trait::async_trait]
impl Tool for UpdateMessageTool {
    type Input = UpdateMessageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_update_message",
            description: "Edit a Slack message the bot previously sent, identified by channel \
                and message timestamp.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "The ID of the channel holding the message."
                    },
                    "ts": {
                        "type": "string",
                        "description": "The timestamp of the message to edit."
                    },
                    "text": {
                        "type": "string",
                        "description": "The replacement message text."
                    },
                    "textFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the replacement text. Use this for large messages instead of 'text'."
                    }
                },
                "required": ["channel", "ts"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.text.as_deref(), input.text_file.as_deref(), "text")?;

        let slack = services.slack().await?;
        let result = slack.update_message(&input.channel, &input.ts, &text).await?;

        Ok(serde_json::to_string_pretty(&json!({
            "ok": result["ok"],
            "ts": result["ts"],
            "channel": result["channel"],
        }))?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionInput {
    pub channel: String,
    pub timestamp: String,
    pub emoji: String,
}

pub struct AddReactionTool;

#[async_trait::async_trait]
impl Tool for AddReactionTool {
    type Input = AddReactionInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_add_reaction",
            description: "Add an emoji reaction to a Slack message.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "The ID of the channel holding the message."
                    },
                    "timestamp": {
                        "type": "string",
                        "description": "The timestamp of the message to react to."
                    },
                    "emoji": {
                        "type": "string",
                        "description": "The emoji name without colons. Example: 'thumbsup'"
                    }
                },
                "required": ["channel", "timestamp", "emoji"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        slack
            .add_reaction(&input.channel, &input.timestamp, &input.emoji)
            .await?;
        Ok(format!("Reaction :{}: added successfully.", input.emoji))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileInput {
    pub channel: String,
    pub file_path: String,
    pub thread_ts: Option<String>,
    pub filename: Option<String>,
}

pub struct UploadFileTool;

#[async_trait::async_trait]
impl Tool for UploadFileTool {
    type Input = UploadFileInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_upload_file",
            description: "Upload a local file to a Slack channel or thread. Reads the file from \
                the specified absolute path on the local filesystem. Returns the file ID and \
                permalink.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "The ID of the Slack channel to upload the file to."
                    },
                    "filePath": {
                        "type": "string",
                        "description": "The absolute path to the file to upload. Example: '/tmp/report.txt'"
                    },
                    "threadTs": {
                        "type": "string",
                        "description": "Timestamp of the parent message to attach the file to a thread."
                    },
                    "filename": {
                        "type": "string",
                        "description": "Custom filename for the uploaded file; defaults to the original name."
                    }
                },
                "required": ["channel", "filePath"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        let result = slack
            .upload_file(
                &input.channel,
                &input.file_path,
                input.thread_ts.as_deref(),
                input.filename.as_deref(),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFileInput {
    pub file_id: String,
    pub destination_path: Option<String>,
}

pub struct DownloadFileTool;

#[async_trait::async_trait]
impl Tool for DownloadFileTool {
    type Input = DownloadFileInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "slack_download_file",
            description: "Download a file from Slack by its file ID. File IDs are included in \
                messages containing attachments (the 'files' array of message objects); use \
                slack_get_conversation_history first to find them. Returns JSON with \
                'file_path' indicating where the file was saved.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "fileId": {
                        "type": "string",
                        "description": "The ID of the Slack file to download. Example: 'F01ABC123DE'"
                    },
                    "destinationPath": {
                        "type": "string",
                        "description": "Absolute path to save the file to; defaults to the system temp directory with the original name."
                    }
                },
                "required": ["fileId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let slack = services.slack().await?;
        let saved = slack
            .download_file(&input.file_id, input.destination_path.as_deref())
            .await?;

        Ok(serde_json::to_string_pretty(&json!({
            "ok": true,
            "file_path": saved.display().to_string(),
        }))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;

    #[tokio::test]
    async fn test_send_message_requires_exactly_one_text_source() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &SendMessageTool,
            &services,
            json!({ "channel": "C01", "text": "hi", "textFile": "/tmp/t.txt" }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'text'"));
        assert!(result.text.contains("'textFile'"));
    }

    #[test]
    fn test_history_defaults() {
        let input: GetConversationHistoryInput =
            serde_json::from_value(json!({ "conversationId": "C01" })).unwrap();
        assert_eq!(input.limit, 25);
        assert!(input.cursor.is_none());
    }
}
