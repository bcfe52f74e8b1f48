use reqwest::StatusCode;
use thiserror::Error;

/// Uniform error shape for the service façades.
///
/// Remote failures keep the raw response body verbatim; nothing below the
/// tool invocation layer tries to interpret or recover from them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required environment variable {variable}. {instruction}")]
    Config {
        variable: String,
        instruction: String,
    },

    #[error("{action} failed: {status} - {body}")]
    RemoteCall {
        action: String,
        status: StatusCode,
        body: String,
    },

    /// Application-level failure reported inside a 2xx response (for example
    /// Slack's `ok: false` envelope).
    #[error("{action} failed: {message}")]
    Service { action: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn service(action: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// Build an `ApiError` from a failed HTTP response, draining the body so the
/// remote service's own error text survives verbatim.
pub async fn remote_error(action: &str, response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ApiError::RemoteCall {
        action: action.to_string(),
        status,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_call_message_format() {
        let err = ApiError::RemoteCall {
            action: "getPullRequest".to_string(),
            status: StatusCode::NOT_FOUND,
            body: "{\"message\":\"Not Found\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "getPullRequest failed: 404 Not Found - {\"message\":\"Not Found\"}"
        );
    }

    #[test]
    fn test_config_message_names_variable() {
        let err = ApiError::Config {
            variable: "GITHUB_API_TOKEN".to_string(),
            instruction: "Set it to a token with repo scope.".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("GITHUB_API_TOKEN"));
        assert!(message.contains("repo scope"));
    }
}
