use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub host: String,
    pub api_token: String,
}

impl GithubConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            host: required_env(
                "GITHUB_HOST",
                "Set it to 'https://api.github.com' for GitHub.com, or your GitHub Enterprise \
                 URL (e.g. 'https://github.mycompany.com').",
            )?
            .trim_end_matches('/')
            .to_string(),
            api_token: required_env(
                "GITHUB_API_TOKEN",
                "Set it to a GitHub Personal Access Token with repo scope.",
            )?,
        })
    }
}

/// GitHub REST API client covering the pull-request review surface.
#[derive(Debug)]
pub struct GithubService {
    config: GithubConfig,
    http: Client,
}

impl GithubService {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(GithubConfig::from_env()?))
    }

    pub fn new(config: GithubConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&["repos", owner, repo, "pulls", &pull_number.to_string()]);
        let response = self.http.get(url).headers(self.auth_headers()).send().await?;
        if !response.status().is_success() {
            return Err(remote_error("getPullRequest", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn get_pull_request_comments(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&[
            "repos",
            owner,
            repo,
            "pulls",
            &pull_number.to_string(),
            "comments",
        ]);
        let response = self.http.get(url).headers(self.auth_headers()).send().await?;
        if !response.status().is_success() {
            return Err(remote_error("getPullRequestComments", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn get_pull_request_diff(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<String, ApiError> {
        let url = self.make_url(&["repos", owner, repo, "pulls", &pull_number.to_string()]);
        let mut headers = self.auth_headers();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.diff"));
        let response = self.http.get(url).headers(headers).send().await?;
        if !response.status().is_success() {
            return Err(remote_error("getPullRequestDiff", response).await);
        }
        Ok(response.text().await?)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_pull_request_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        body: &str,
        commit_id: &str,
        path: &str,
        line: u64,
        side: &str,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&[
            "repos",
            owner,
            repo,
            "pulls",
            &pull_number.to_string(),
            "comments",
        ]);
        let payload = json!({
            "body": body,
            "commit_id": commit_id,
            "path": path,
            "line": line,
            "side": side,
        });
        let response = self
            .http
            .post(url)
            .headers(self.auth_headers())
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("addPullRequestComment", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        event: &str,
        body: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = self.make_url(&[
            "repos",
            owner,
            repo,
            "pulls",
            &pull_number.to_string(),
            "reviews",
        ]);
        let mut payload = json!({ "event": event });
        if let Some(body) = body {
            payload["body"] = json!(body);
        }
        let response = self
            .http
            .post(url)
            .headers(self.auth_headers())
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("submitReview", response).await);
        }
        Ok(response.json().await?)
    }

    /// GitHub.com serves the REST API from the host root; GitHub Enterprise
    /// serves it under `/api/v3`.
    fn make_url(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        let path = path.join("/");

        if self.config.host.contains("api.github.com") {
            format!("{}/{}", self.config.host, path)
        } else {
            format!("{}/api/v3/{}", self.config.host, path)
        }
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.config.api_token)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Ok(value) = HeaderValue::from_str(API_VERSION) {
            headers.insert("X-GitHub-Api-Version", value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(host: &str) -> GithubService {
        GithubService::new(GithubConfig {
            host: host.to_string(),
            api_token: "token".to_string(),
        })
    }

    #[test]
    fn test_github_com_url() {
        let service = service("https://api.github.com");
        assert_eq!(
            service.make_url(&["repos", "platform", "playground", "pulls", "1"]),
            "https://api.github.com/repos/platform/playground/pulls/1"
        );
    }

    #[test]
    fn test_enterprise_url_gets_api_v3_prefix() {
        let service = service("https://github.mycompany.com");
        assert_eq!(
            service.make_url(&["repos", "platform", "playground", "pulls", "1"]),
            "https://github.mycompany.com/api/v3/repos/platform/playground/pulls/1"
        );
    }

    #[tokio::test]
    async fn test_failed_call_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/repos/o/r/pulls/2")
            .with_status(404)
            .with_body("{\"message\":\"Not Found\"}")
            .create_async()
            .await;

        let service = service(&server.url());
        let err = service.get_pull_request("o", "r", 2).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("getPullRequest failed"));
        assert!(message.contains("404"));
        assert!(message.contains("Not Found"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_successful_call_returns_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/repos/o/r/pulls/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"number\": 3, \"title\": \"Fix parser\"}")
            .create_async()
            .await;

        let service = service(&server.url());
        let pr = service.get_pull_request("o", "r", 3).await.unwrap();
        assert_eq!(pr["number"], 3);
        assert_eq!(pr["title"], "Fix parser");
        mock.assert_async().await;
    }
}
