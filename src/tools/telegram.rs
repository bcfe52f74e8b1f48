//! Telegram bot messaging and file tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(SendMessageTool),
        Box::new(UpdateMessageTool),
        Box::new(DeleteMessageTool),
        Box::new(GetChatTool),
        Box::new(SendDocumentTool),
        Box::new(SendPhotoTool),
        Box::new(DownloadFileTool),
        Box::new(SetMessageReactionTool),
    ]
}

fn chat_id_property() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "The target chat ID or @channelusername. Example: '123456789' or '@mychannel'"
    })
}

fn parse_mode_property() -> serde_json::Value {
    json!({
        "type": "string",
        "enum": ["HTML", "Markdown", "MarkdownV2"],
        "description": "How Telegram should parse formatting in the text. Plain text when omitted."
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    pub chat_id: String,
    pub text: Option<String>,
    pub text_file: Option<String>,
    pub reply_to_message_id: Option<i64>,
    pub parse_mode: Option<String>,
}

pub struct SendMessageTool;

#[async_trait::async_trait]
impl Tool for SendMessageTool {
    type Input = SendMessageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_send_message",
            description: "Send a text message to a Telegram chat, optionally as a reply to \
                another message. Returns the sent message's ID, which can be used with \
                telegram_update_message or telegram_delete_message.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "chatId": chat_id_property(),
                    "text": {
                        "type": "string",
                        "description": "The message text to send."
                    },
                    "textFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the message text. Use this for long messages instead of 'text'."
                    },
                    "replyToMessageId": {
                        "type": "integer",
                        "description": "Message ID to reply to. Example: 123"
                    },
                    "parseMode": parse_mode_property()
                },
                "required": ["chatId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.text.as_deref(), input.text_file.as_deref(), "text")?;

        let telegram = services.telegram().await?;
        let message = telegram
            .send_message(
                &input.chat_id,
                &text,
                input.reply_to_message_id,
                input.parse_mode.as_deref(),
            )
            .await?;

        Ok(format!(
            "Message sent successfully. Message ID: {}",
            message["message_id"]
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageInput {
    pub chat_id: String,
    pub message_id: i64,
    pub text: Option<String>,
    pub text_file: Option<String>,
    pub parse_mode: Option<String>,
}

pub struct UpdateMessageTool;

#[async_trait::async_trait]
impl Tool for UpdateMessageTool {
    type Input = UpdateMessageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_update_message",
            description: "Edit the text of a message the bot previously sent.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "chatId": chat_id_property(),
                    "messageId": {
                        "type": "integer",
                        "description": "The message ID of the message to edit. Example: 123"
                    },
                    "text": {
                        "type": "string",
                        "description": "The replacement message text."
                    },
                    "textFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the replacement text. Use this for long messages instead of 'text'."
                    },
                    "parseMode": parse_mode_property()
                },
                "required": ["chatId", "messageId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.text.as_deref(), input.text_file.as_deref(), "text")?;

        let telegram = services.telegram().await?;
        telegram
            .edit_message_text(
                &input.chat_id,
                input.message_id,
                &text,
                input.parse_mode.as_deref(),
            )
            .await?;

        Ok(format!("Message {} updated successfully.", input.message_id))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageInput {
    pub chat_id: String,
    pub message_id: i64,
}

pub struct DeleteMessageTool;

#[async_trait::async_trait]
impl Tool for DeleteMessageTool {
    type Input = DeleteMessageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_delete_message",
            description: "Delete a message from a Telegram chat. Bots can only delete recent \
                messages and only where they have the right permissions.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "chatId": chat_id_property(),
                    "messageId": {
                        "type": "integer",
                        "description": "The message ID of the message to delete. Example: 123"
                    }
                },
                "required": ["chatId", "messageId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        telegram
            .delete_message(&input.chat_id, input.message_id)
            .await?;
        Ok(format!("Message {} deleted successfully.", input.message_id))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChatInput {
    pub chat_id: String,
}

pub struct GetChatTool;

#[async_trait::async_trait]
impl Tool for GetChatTool {
    type Input = GetChatInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_get_chat",
            description: "Get information about a Telegram chat (type, title, description, \
                usernames). Results are written to a temporary file as JSON and the file path \
                is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "chatId": chat_id_property()
                },
                "required": ["chatId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "telegram",
            tool_ref: "get-chat",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        Ok(serde_json::to_string_pretty(&telegram.get_chat(&input.chat_id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFileInput {
    pub chat_id: String,
    pub file_path: String,
    pub caption: Option<String>,
    pub reply_to_message_id: Option<i64>,
}

fn send_file_schema(path_description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "chatId": chat_id_property(),
            "filePath": {
                "type": "string",
                "description": path_description
            },
            "caption": {
                "type": "string",
                "description": "Optional caption shown with the file."
            },
            "replyToMessageId": {
                "type": "integer",
                "description": "Message ID to reply to."
            }
        },
        "required": ["chatId", "filePath"]
    })
}

pub struct SendDocumentTool;

#[async_trait::async_trait]
impl Tool for SendDocumentTool {
    type Input = SendFileInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_send_document",
            description: "Send a local file to a Telegram chat as a document attachment.",
            parameters_schema: send_file_schema(
                "The absolute path of the local file to send. Example: '/tmp/report.pdf'",
            ),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        let message = telegram
            .send_document(
                &input.chat_id,
                &input.file_path,
                input.caption.as_deref(),
                input.reply_to_message_id,
            )
            .await?;
        Ok(format!(
            "Document sent successfully. Message ID: {}",
            message["message_id"]
        ))
    }
}

pub struct SendPhotoTool;

#[async_trait::async_trait]
impl Tool for SendPhotoTool {
    type Input = SendFileInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_send_photo",
            description: "Send a local image to a Telegram chat as a photo.",
            parameters_schema: send_file_schema(
                "The absolute path of the local image to send. Example: '/tmp/chart.png'",
            ),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        let message = telegram
            .send_photo(
                &input.chat_id,
                &input.file_path,
                input.caption.as_deref(),
                input.reply_to_message_id,
            )
            .await?;
        Ok(format!(
            "Photo sent successfully. Message ID: {}",
            message["message_id"]
        ))
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
            name: "telegram_download_file",
            description: "Download a file from Telegram by its file ID (found on message \
                attachments such as documents and photos). Returns JSON with 'file_path' \
                indicating where the file was saved.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "fileId": {
                        "type": "string",
                        "description": "The file ID from a message attachment."
                    },
                    "destinationPath": {
                        "type": "string",
                        "description": "Absolute path to save the file to; defaults to the system temp directory."
                    }
                },
                "required": ["fileId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        let saved = telegram
            .download_file(&input.file_id, input.destination_path.as_deref())
            .await?;

        Ok(serde_json::to_string_pretty(&json!({
            "ok": true,
            "file_path": saved.display().to_string(),
        }))?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMessageReactionInput {
    pub chat_id: String,
    pub message_id: i64,
    pub emoji: Option<String>,
}

pub struct SetMessageReactionTool;

#[async_trait::async_trait]
impl Tool for SetMessageReactionTool {
    type Input = SetMessageReactionInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "telegram_set_message_reaction",
            description: "Set or clear an emoji reaction on a Telegram message. Omit 'emoji' to \
                remove the bot's reaction. Telegram only allows a specific set of reaction \
                emoji.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "chatId": chat_id_property(),
                    "messageId": {
                        "type": "integer",
                        "description": "The message ID of the message to react to. Example: 123"
                    },
                    "emoji": {
                        "type": "string",
                        "description": "The reaction emoji, e.g. '\u{1F44D}'. Omit to clear the reaction."
                    }
                },
                "required": ["chatId", "messageId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let telegram = services.telegram().await?;
        telegram
            .set_message_reaction(&input.chat_id, input.message_id, input.emoji.as_deref())
            .await?;
        Ok(match input.emoji {
            Some(emoji) => format!("Reaction {emoji} set on message {}.", input.message_id),
            None => format!("Reaction cleared on message {}.", input.message_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;

    #[tokio::test]
    async fn test_send_message_requires_text() {
        let services = ServiceRegistry::new();
        let result = invoke(&SendMessageTool, &services, json!({ "chatId": "42" })).await;
        assert!(result.is_error);
        assert!(result.text.contains("'text'"));
        assert!(result.text.contains("'textFile'"));
    }

    #[test]
    fn test_reaction_input_accepts_missing_emoji() {
        let input: SetMessageReactionInput =
            serde_json::from_value(json!({ "chatId": "42", "messageId": 7 })).unwrap();
        assert!(input.emoji.is_none());
    }
}
