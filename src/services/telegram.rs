use std::path::{Path, PathBuf};

use reqwest::multipart;
use reqwest::Client;
use serde_json::{json, Value};

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Telegram Bot API client.
///
/// Every response is wrapped in `{ok, result, description, error_code}`;
/// `unwrap_result` turns `ok: false` into an error carrying the description
/// and the code.
pub struct TelegramService {
    base_url: String,
    token: String,
    http: Client,
}

impl TelegramService {
    pub fn from_env() -> Result<Self, ApiError> {
        let token = required_env(
            "TELEGRAM_BOT_TOKEN",
            "Set it to your Telegram bot token from @BotFather.",
        )?;
        Ok(Self::new(DEFAULT_BASE_URL.to_string(), token))
    }

    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url,
            token,
            http: Client::new(),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
        parse_mode: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(id) = reply_to_message_id {
            body["reply_to_message_id"] = json!(id);
        }
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        self.call("sendMessage", body).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        self.call("editMessageText", body).await
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<Value, ApiError> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Value, ApiError> {
        self.call("getChat", json!({ "chat_id": chat_id })).await
    }

    pub async fn send_document(
        &self,
        chat_id: &str,
        file_path: &str,
        caption: Option<&str>,
        reply_to_message_id: Option<i64>,
    ) -> Result<Value, ApiError> {
        self.send_file("sendDocument", "document", chat_id, file_path, caption, reply_to_message_id)
            .await
    }

    pub async fn send_photo(
        &self,
        chat_id: &str,
        file_path: &str,
        caption: Option<&str>,
        reply_to_message_id: Option<i64>,
    ) -> Result<Value, ApiError> {
        self.send_file("sendPhoto", "photo", chat_id, file_path, caption, reply_to_message_id)
            .await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<Value, ApiError> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }

    /// Resolve a file id to its server-side path and download it to
    /// `destination_path`, or `{temp}/telegram-{name}` when no destination
    /// is given.
    pub async fn download_file(
        &self,
        file_id: &str,
        destination_path: Option<&str>,
    ) -> Result<PathBuf, ApiError> {
        let info = self.get_file(file_id).await?;
        let remote_path = info
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::service(
                    "downloadFile",
                    "file path not available; the file may be too large",
                )
            })?;

        let response = self
            .http
            .get(format!(
                "{}/file/bot{}/{}",
                self.base_url, self.token, remote_path
            ))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("downloadFile", response).await);
        }

        let name = Path::new(remote_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let path = match destination_path {
            Some(destination) => PathBuf::from(destination),
            None => std::env::temp_dir().join(format!("telegram-{name}")),
        };

        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }

    pub async fn set_message_reaction(
        &self,
        chat_id: &str,
        message_id: i64,
        emoji: Option<&str>,
    ) -> Result<Value, ApiError> {
        let reaction = match emoji {
            Some(emoji) => json!([{ "type": "emoji", "emoji": emoji }]),
            None => json!([]),
        };
        self.call(
            "setMessageReaction",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "reaction": reaction,
            }),
        )
        .await
    }

    async fn send_file(
        &self,
        method: &str,
        part_name: &'static str,
        chat_id: &str,
        file_path: &str,
        caption: Option<&str>,
        reply_to_message_id: Option<i64>,
    ) -> Result<Value, ApiError> {
        if !Path::new(file_path).exists() {
            return Err(ApiError::service(
                method,
                format!("file not found: {file_path}"),
            ));
        }
        let bytes = std::fs::read(file_path)?;
        let file_name = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let mut form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part(part_name, multipart::Part::bytes(bytes).file_name(file_name));
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        if let Some(id) = reply_to_message_id {
            form = form.text("reply_to_message_id", id.to_string());
        }

        let response = self
            .http
            .post(self.make_url(method))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(method, response).await);
        }
        unwrap_result(response.json().await?)
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(self.make_url(method))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(method, response).await);
        }
        unwrap_result(response.json().await?)
    }

    fn make_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

fn unwrap_result(data: Value) -> Result<Value, ApiError> {
    if data.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(data.get("result").cloned().unwrap_or(Value::Null));
    }
    let description = data
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    let code = data
        .get("error_code")
        .and_then(Value::as_u64)
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Err(ApiError::service(
        "Telegram API",
        format!("{description} (code: {code})"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_result_success() {
        let result = unwrap_result(json!({
            "ok": true,
            "result": { "message_id": 7 },
        }))
        .unwrap();
        assert_eq!(result["message_id"], 7);
    }

    #[test]
    fn test_unwrap_result_failure_carries_description_and_code() {
        let err = unwrap_result(json!({
            "ok": false,
            "description": "Bad Request: chat not found",
            "error_code": 400,
        }))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Bad Request: chat not found"));
        assert!(message.contains("code: 400"));
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bottoken123/sendMessage")
            .match_body(mockito::Matcher::PartialJson(json!({
                "chat_id": "42",
                "text": "hi",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"ok\": true, \"result\": {\"message_id\": 1}}")
            .create_async()
            .await;

        let service = TelegramService::new(server.url(), "token123".to_string());
        let message = service.send_message("42", "hi", None, None).await.unwrap();
        assert_eq!(message["message_id"], 1);
        mock.assert_async().await;
    }
}
