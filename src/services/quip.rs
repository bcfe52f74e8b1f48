use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

const DEFAULT_BASE_URL: &str = "https://platform.quip.com/1";

/// Quip Automation API client. Reads are plain GETs; writes are
/// form-encoded POSTs, which is what the Quip API expects.
pub struct QuipService {
    base_url: String,
    api_token: String,
    http: Client,
}

/// Maps the edit operation names exposed by the tools onto Quip's numeric
/// `location` values. Document-level append/prepend intentionally send no
/// location at all: some Quip instances reject a location without a
/// section_id.
pub fn edit_location(operation: &str) -> Option<u8> {
    match operation {
        "replace" => Some(0),
        "prepend" => Some(1),
        "append" => Some(2),
        "after_section" => Some(3),
        "before_section" => Some(4),
        "delete" => Some(5),
        _ => None,
    }
}

impl QuipService {
    pub fn from_env() -> Result<Self, ApiError> {
        let api_token = required_env(
            "QUIP_API_TOKEN",
            "Set it to your Quip API token. Get one at https://quip.com/dev/token",
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

    pub async fn get_thread(&self, thread_id: &str) -> Result<Value, ApiError> {
        self.get("getThread", &format!("/threads/{}", urlencoding::encode(thread_id)), &[])
            .await
    }

    pub async fn get_folder(&self, folder_id: &str) -> Result<Value, ApiError> {
        self.get("getFolder", &format!("/folders/{}", urlencoding::encode(folder_id)), &[])
            .await
    }

    pub async fn search_threads(
        &self,
        query: &str,
        count: u64,
        only_match_titles: bool,
    ) -> Result<Value, ApiError> {
        self.get(
            "searchThreads",
            "/threads/search",
            &[
                ("query", query.to_string()),
                ("count", count.to_string()),
                ("only_match_titles", only_match_titles.to_string()),
            ],
        )
        .await
    }

    pub async fn get_recent_threads(
        &self,
        count: u64,
        max_updated_usec: Option<u64>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![("count", count.to_string())];
        if let Some(usec) = max_updated_usec {
            params.push(("max_updated_usec", usec.to_string()));
        }
        self.get("getRecentThreads", "/threads/recent", &params).await
    }

    pub async fn get_messages(
        &self,
        thread_id: &str,
        count: u64,
        max_created_usec: Option<u64>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![("count", count.to_string())];
        if let Some(usec) = max_created_usec {
            params.push(("max_created_usec", usec.to_string()));
        }
        self.get(
            "getMessages",
            &format!("/messages/{}", urlencoding::encode(thread_id)),
            &params,
        )
        .await
    }

    pub async fn create_document(
        &self,
        title: &str,
        content: &str,
        member_ids: &[String],
        format: &str,
    ) -> Result<Value, ApiError> {
        let mut form = vec![
            ("title", title.to_string()),
            ("content", content.to_string()),
            ("format", format.to_string()),
        ];
        if !member_ids.is_empty() {
            form.push(("member_ids", member_ids.join(",")));
        }
        self.post("createDocument", "/threads/new-document", &form).await
    }

    pub async fn edit_document(
        &self,
        thread_id: &str,
        content: &str,
        section_id: Option<&str>,
        operation: &str,
        format: &str,
    ) -> Result<Value, ApiError> {
        let mut form = vec![
            ("thread_id", thread_id.to_string()),
            ("content", content.to_string()),
            ("format", format.to_string()),
        ];
        if let Some(section_id) = section_id {
            form.push(("section_id", section_id.to_string()));
        }

        // Only section-scoped operations carry an explicit location; the API
        // defaults to appending at document level.
        if operation != "append" && operation != "prepend" {
            if section_id.is_some() {
                if let Some(location) = edit_location(operation) {
                    form.push(("location", location.to_string()));
                }
            }
        }

        self.post("editDocument", "/threads/edit-document", &form).await
    }

    pub async fn new_message(
        &self,
        thread_id: &str,
        content: &str,
        section_id: Option<&str>,
        annotation_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut form = vec![
            ("thread_id", thread_id.to_string()),
            ("content", content.to_string()),
        ];
        if let Some(section_id) = section_id {
            form.push(("section_id", section_id.to_string()));
        }
        if let Some(annotation_id) = annotation_id {
            form.push(("annotation_id", annotation_id.to_string()));
        }
        self.post("newMessage", "/messages/new", &form).await
    }

    async fn get(
        &self,
        action: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .headers(self.auth_headers())
            .query(params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(action, response).await);
        }
        Ok(response.json().await?)
    }

    async fn post(
        &self,
        action: &str,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .headers(self.auth_headers())
            .form(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(action, response).await);
        }
        Ok(response.json().await?)
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

    #[test]
    fn test_edit_location_mapping() {
        assert_eq!(edit_location("replace"), Some(0));
        assert_eq!(edit_location("prepend"), Some(1));
        assert_eq!(edit_location("append"), Some(2));
        assert_eq!(edit_location("after_section"), Some(3));
        assert_eq!(edit_location("before_section"), Some(4));
        assert_eq!(edit_location("delete"), Some(5));
        assert_eq!(edit_location("unknown"), None);
    }

    #[tokio::test]
    async fn test_search_threads_sends_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/threads/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("query".into(), "roadmap".into()),
                mockito::Matcher::UrlEncoded("count".into(), "10".into()),
                mockito::Matcher::UrlEncoded("only_match_titles".into(), "false".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let service = QuipService::new(server.url(), "token".to_string());
        let result = service.search_threads("roadmap", 10, false).await.unwrap();
        assert!(result.as_array().unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_includes_response_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/threads/T1")
            .with_status(403)
            .with_body("token revoked")
            .create_async()
            .await;

        let service = QuipService::new(server.url(), "token".to_string());
        let err = service.get_thread("T1").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("getThread failed"));
        assert!(message.contains("403"));
        assert!(message.contains("token revoked"));
    }
}
