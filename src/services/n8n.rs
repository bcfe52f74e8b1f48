use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{Map, Value};

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

#[derive(Debug, Clone)]
pub struct N8nConfig {
    pub host: String,
    pub api_key: String,
}

impl N8nConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            host: required_env(
                "N8N_HOST",
                "Set it to your n8n instance URL (e.g., 'https://n8n.example.com').",
            )?
            .trim_end_matches('/')
            .to_string(),
            api_key: required_env(
                "N8N_API_KEY",
                "Set it to your n8n API key. Generate one in n8n Settings > API.",
            )?,
        })
    }
}

/// Optional pieces of a workflow create/update payload. Every field is
/// already-parsed JSON; the service passes them through untouched.
#[derive(Debug, Default)]
pub struct WorkflowPayload {
    pub name: Option<String>,
    pub nodes: Option<Value>,
    pub connections: Option<Value>,
    pub settings: Option<Value>,
}

impl WorkflowPayload {
    fn into_body(self) -> Value {
        let mut body = Map::new();
        if let Some(name) = self.name {
            body.insert("name".to_string(), Value::String(name));
        }
        if let Some(nodes) = self.nodes {
            body.insert("nodes".to_string(), nodes);
        }
        if let Some(connections) = self.connections {
            body.insert("connections".to_string(), connections);
        }
        if let Some(settings) = self.settings {
            body.insert("settings".to_string(), settings);
        }
        Value::Object(body)
    }
}

/// n8n public API (v1) client for workflows, executions, and tags.
pub struct N8nService {
    config: N8nConfig,
    http: Client,
}

impl N8nService {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(N8nConfig::from_env()?))
    }

    pub fn new(config: N8nConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub async fn list_workflows(
        &self,
        active: Option<bool>,
        tags: Option<&str>,
        limit: Option<u64>,
        cursor: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(active) = active {
            params.push(("active", active.to_string()));
        }
        if let Some(tags) = tags {
            params.push(("tags", tags.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let response = self
            .http
            .get(self.make_url(&["workflows"]))
            .headers(self.auth_headers())
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("listWorkflows", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Value, ApiError> {
        self.simple("getWorkflow", reqwest::Method::GET, &["workflows", id])
            .await
    }

    pub async fn create_workflow(&self, payload: WorkflowPayload) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(self.make_url(&["workflows"]))
            .headers(self.auth_headers())
            .json(&payload.into_body())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("createWorkflow", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn update_workflow(
        &self,
        id: &str,
        payload: WorkflowPayload,
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .put(self.make_url(&["workflows", id]))
            .headers(self.auth_headers())
            .json(&payload.into_body())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("updateWorkflow", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<Value, ApiError> {
        self.simple("deleteWorkflow", reqwest::Method::DELETE, &["workflows", id])
            .await
    }

    pub async fn activate_workflow(&self, id: &str) -> Result<Value, ApiError> {
        self.simple(
            "activateWorkflow",
            reqwest::Method::POST,
            &["workflows", id, "activate"],
        )
        .await
    }

    pub async fn deactivate_workflow(&self, id: &str) -> Result<Value, ApiError> {
        self.simple(
            "deactivateWorkflow",
            reqwest::Method::POST,
            &["workflows", id, "deactivate"],
        )
        .await
    }

    pub async fn list_executions(
        &self,
        workflow_id: Option<&str>,
        status: Option<&str>,
        limit: Option<u64>,
        cursor: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(workflow_id) = workflow_id {
            params.push(("workflowId", workflow_id.to_string()));
        }
        if let Some(status) = status {
            params.push(("status", status.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let response = self
            .http
            .get(self.make_url(&["executions"]))
            .headers(self.auth_headers())
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("listExecutions", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn get_execution(&self, id: &str) -> Result<Value, ApiError> {
        self.simple("getExecution", reqwest::Method::GET, &["executions", id])
            .await
    }

    pub async fn delete_execution(&self, id: &str) -> Result<Value, ApiError> {
        self.simple("deleteExecution", reqwest::Method::DELETE, &["executions", id])
            .await
    }

    pub async fn list_tags(&self) -> Result<Value, ApiError> {
        self.simple("listTags", reqwest::Method::GET, &["tags"]).await
    }

    async fn simple(
        &self,
        action: &str,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .request(method, self.make_url(segments))
            .headers(self.auth_headers())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(action, response).await);
        }
        Ok(response.json().await?)
    }

    fn make_url(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/api/v1/{}", self.config.host, path.join("/"))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.config.api_key) {
            headers.insert("X-N8N-API-KEY", value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(host: &str) -> N8nService {
        N8nService::new(N8nConfig {
            host: host.to_string(),
            api_key: "key".to_string(),
        })
    }

    #[test]
    fn test_url_building() {
        let service = service("https://n8n.example.com");
        assert_eq!(
            service.make_url(&["workflows", "42", "activate"]),
            "https://n8n.example.com/api/v1/workflows/42/activate"
        );
    }

    #[test]
    fn test_workflow_payload_skips_absent_fields() {
        let payload = WorkflowPayload {
            name: Some("My flow".to_string()),
            nodes: Some(json!([{"id": "n1"}])),
            connections: None,
            settings: None,
        };
        let body = payload.into_body();
        assert_eq!(body["name"], "My flow");
        assert_eq!(body["nodes"][0]["id"], "n1");
        assert!(body.get("connections").is_none());
        assert!(body.get("settings").is_none());
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tags")
            .match_header("X-N8N-API-KEY", "key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"data\": []}")
            .create_async()
            .await;

        let service = service(&server.url());
        let tags = service.list_tags().await.unwrap();
        assert!(tags["data"].as_array().unwrap().is_empty());
        mock.assert_async().await;
    }
}
