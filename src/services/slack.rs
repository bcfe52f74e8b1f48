use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Slack Web API client.
///
/// Slack reports application failures inside 2xx responses as
/// `{"ok": false, "error": "..."}`; every call unwraps that envelope and
/// turns `ok: false` into an `ApiError::Service`.
pub struct SlackService {
    base_url: String,
    api_token: String,
    http: Client,
}

impl SlackService {
    pub fn from_env() -> Result<Self, ApiError> {
        let api_token = required_env(
            "SLACK_API_TOKEN",
            "Set it to your Slack bot token (xoxb-...).",
        )?;
        Ok(Self::new(DEFAULT_BASE_URL.to_string(), api_token))
    }

    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            base_url,
            api_token,
            http: Client::new(),
        }
    }

    pub async fn get_conversation_history(
        &self,
        conversation_id: &str,
        limit: u64,
        cursor: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("channel", conversation_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        self.get("conversations.history", &params).await
    }

    pub async fn get_conversation_replies(
        &self,
        conversation_id: &str,
        thread_ts: &str,
        limit: u64,
        cursor: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("channel", conversation_id.to_string()),
            ("ts", thread_ts.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        self.get("conversations.replies", &params).await
    }

    pub async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = json!({
            "channel": conversation_id,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = json!(thread_ts);
        }
        self.post("chat.postMessage", body).await
    }

    pub async fn update_message(
        &self,
        conversation_id: &str,
        message_ts: &str,
        text: &str,
    ) -> Result<Value, ApiError> {
        self.post(
            "chat.update",
            json!({
                "channel": conversation_id,
                "ts": message_ts,
                "text": text,
            }),
        )
        .await
    }

    pub async fn add_reaction(
        &self,
        conversation_id: &str,
        message_ts: &str,
        emoji: &str,
    ) -> Result<Value, ApiError> {
        self.post(
            "reactions.add",
            json!({
                "channel": conversation_id,
                "timestamp": message_ts,
                "name": emoji,
            }),
        )
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Value, ApiError> {
        self.get("users.info", &[("user", user_id.to_string())]).await
    }

    pub async fn list_channels(
        &self,
        limit: u64,
        cursor: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("limit", limit.to_string()),
            ("types", "public_channel,private_channel".to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        self.get("conversations.list", &params).await
    }

    /// Upload a local file via Slack's external upload flow:
    /// request an upload URL, push the bytes there, then complete the upload
    /// against the target channel (and optionally a thread).
    pub async fn upload_file(
        &self,
        conversation_id: &str,
        file_path: &str,
        thread_ts: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Value, ApiError> {
        let bytes = std::fs::read(file_path)?;
        let name = file_name
            .map(str::to_string)
            .or_else(|| {
                Path::new(file_path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "file".to_string());

        let ticket = self
            .get(
                "files.getUploadURLExternal",
                &[
                    ("filename", name.clone()),
                    ("length", bytes.len().to_string()),
                ],
            )
            .await?;
        let upload_url = ticket
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::service("files.getUploadURLExternal", "response carried no upload_url")
            })?;
        let file_id = ticket
            .get("file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::service("files.getUploadURLExternal", "response carried no file_id")
            })?
            .to_string();

        let response = self.http.post(upload_url).body(bytes).send().await?;
        if !response.status().is_success() {
            return Err(remote_error("uploadFileBytes", response).await);
        }

        let mut body = json!({
            "files": [{ "id": file_id, "title": name }],
            "channel_id": conversation_id,
        });
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = json!(thread_ts);
        }
        self.post("files.completeUploadExternal", body).await
    }

    /// Download a Slack file by id into `destination_path`, or the temp
    /// directory under its original name when no destination is given.
    pub async fn download_file(
        &self,
        file_id: &str,
        destination_path: Option<&str>,
    ) -> Result<PathBuf, ApiError> {
        let info = self.get("files.info", &[("file", file_id.to_string())]).await?;
        let file = info
            .get("file")
            .ok_or_else(|| ApiError::service("files.info", "response carried no file object"))?;
        let url = file
            .get("url_private")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::service("files.info", "file has no url_private"))?;
        let name = file
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("slack-file");

        let path = match destination_path {
            Some(destination) => PathBuf::from(destination),
            None => std::env::temp_dir().join(name),
        };

        let response = self
            .http
            .get(url)
            .headers(self.auth_headers())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("downloadFile", response).await);
        }
        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }

    async fn get(&self, method: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, method))
            .headers(self.auth_headers())
            .query(params)
            .send()
            .await?;
        self.unwrap_envelope(method, response).await
    }

    async fn post(&self, method: &str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .headers(self.auth_headers())
            .json(&body)
            .send()
            .await?;
        self.unwrap_envelope(method, response).await
    }

    async fn unwrap_envelope(
        &self,
        action: &str,
        response: reqwest::Response,
    ) -> Result<Value, ApiError> {
        if !response.status().is_success() {
            return Err(remote_error(action, response).await);
        }
        let data: Value = response.json().await?;
        if data.get("ok").and_then(Value::as_bool) != Some(true) {
            let detail = data
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Slack API error");
            return Err(ApiError::service(action, detail));
        }
        Ok(data)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_token)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ok_false_becomes_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users.info")
            .match_query(mockito::Matcher::UrlEncoded("user".into(), "U1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"ok\": false, \"error\": \"user_not_found\"}")
            .create_async()
            .await;

        let service = SlackService::new(server.url(), "xoxb-token".to_string());
        let err = service.get_user("U1").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("users.info failed"));
        assert!(message.contains("user_not_found"));
    }

    #[tokio::test]
    async fn test_post_message_threads() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "channel": "C01",
                "text": "hello",
                "thread_ts": "123.456",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"ok\": true, \"ts\": \"123.789\", \"channel\": \"C01\"}")
            .create_async()
            .await;

        let service = SlackService::new(server.url(), "xoxb-token".to_string());
        let result = service
            .post_message("C01", "hello", Some("123.456"))
            .await
            .unwrap();
        assert_eq!(result["ts"], "123.789");
        mock.assert_async().await;
    }
}
