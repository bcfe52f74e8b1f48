use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub host: String,
    pub email_address: String,
    pub api_token: String,
}

impl JiraConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            host: required_env(
                "JIRA_HOST",
                "Set it to your Jira base URL, e.g. 'https://your-org.atlassian.net'.",
            )?
            .trim_end_matches('/')
            .to_string(),
            email_address: required_env(
                "JIRA_EMAIL_ADDRESS",
                "Set it to the Jira user email address, e.g. 'you@company.com'.",
            )?,
            api_token: required_env("JIRA_API_TOKEN", "Set it to an Atlassian API token.")?,
        })
    }
}

/// Jira Cloud REST v3 client (read-only issue surface).
pub struct JiraService {
    config: JiraConfig,
    http: Client,
}

impl JiraService {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(JiraConfig::from_env()?))
    }

    pub fn new(config: JiraConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub async fn get_issue(
        &self,
        issue_id_or_key: &str,
        fields: &str,
        expand: &str,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&["issue", issue_id_or_key]);
        let response = self
            .http
            .get(url)
            .headers(self.auth_headers())
            .query(&[("fields", fields), ("expand", expand)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("getIssue", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u64,
        fields: &str,
        expand: &str,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&["search", "jql"]);
        let response = self
            .http
            .get(url)
            .headers(self.auth_headers())
            .query(&[
                ("jql", jql),
                ("startAt", &start_at.to_string()),
                ("maxResults", &max_results.to_string()),
                ("fields", fields),
                ("expand", expand),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("searchIssues", response).await);
        }
        Ok(response.json().await?)
    }

    fn make_url(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/rest/api/3/{}", self.config.host, path.join("/"))
    }

    fn auth_headers(&self) -> HeaderMap {
        let credentials = format!(
            "{}:{}",
            self.config.email_address.trim(),
            self.config.api_token.trim()
        );
        let encoded = BASE64.encode(credentials.as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Basic {encoded}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(host: &str) -> JiraService {
        JiraService::new(JiraConfig {
            host: host.to_string(),
            email_address: "you@company.com".to_string(),
            api_token: "token123".to_string(),
        })
    }

    #[test]
    fn test_url_building() {
        let service = service("https://org.atlassian.net");
        assert_eq!(
            service.make_url(&["issue", "PROJ-123"]),
            "https://org.atlassian.net/rest/api/3/issue/PROJ-123"
        );
    }

    #[test]
    fn test_basic_auth_header() {
        let service = service("https://org.atlassian.net");
        let headers = service.auth_headers();
        let auth = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert_eq!(
            auth,
            format!("Basic {}", BASE64.encode("you@company.com:token123"))
        );
    }

    #[tokio::test]
    async fn test_get_issue_passes_query_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/PROJ-1")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("fields".into(), "*navigable".into()),
                mockito::Matcher::UrlEncoded("expand".into(), "names".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"key\": \"PROJ-1\"}")
            .create_async()
            .await;

        let service = service(&server.url());
        let issue = service.get_issue("PROJ-1", "*navigable", "names").await.unwrap();
        assert_eq!(issue["key"], "PROJ-1");
        mock.assert_async().await;
    }
}
