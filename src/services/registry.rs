use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::services::error::ApiError;
use crate::services::github::GithubService;
use crate::services::jira::JiraService;
use crate::services::n8n::N8nService;
use crate::services::pocketbase::PocketBaseService;
use crate::services::quip::QuipService;
use crate::services::replicate::ReplicateService;
use crate::services::slack::SlackService;
use crate::services::telegram::TelegramService;

/// Lazily constructed, per-process service façades.
///
/// Each façade is built from environment configuration the first time a tool
/// asks for it, so a server exposing only a subset of modules never demands
/// credentials for the rest. Construction failures (missing env vars) are
/// reported to the calling tool and retried on the next access; the
/// configuration is read-only once a façade exists.
///
/// The registry is an explicit dependency of the message handler rather than
/// a module-level global, so tests can run against a fresh instance.
#[derive(Default)]
pub struct ServiceRegistry {
    github: OnceCell<Arc<GithubService>>,
    jira: OnceCell<Arc<JiraService>>,
    quip: OnceCell<Arc<QuipService>>,
    n8n: OnceCell<Arc<N8nService>>,
    pocketbase: OnceCell<Arc<PocketBaseService>>,
    replicate: OnceCell<Arc<ReplicateService>>,
    slack: OnceCell<Arc<SlackService>>,
    telegram: OnceCell<Arc<TelegramService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn github(&self) -> Result<Arc<GithubService>, ApiError> {
        self.github
            .get_or_try_init(|| async { GithubService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn jira(&self) -> Result<Arc<JiraService>, ApiError> {
        self.jira
            .get_or_try_init(|| async { JiraService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn quip(&self) -> Result<Arc<QuipService>, ApiError> {
        self.quip
            .get_or_try_init(|| async { QuipService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn n8n(&self) -> Result<Arc<N8nService>, ApiError> {
        self.n8n
            .get_or_try_init(|| async { N8nService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn pocketbase(&self) -> Result<Arc<PocketBaseService>, ApiError> {
        self.pocketbase
            .get_or_try_init(|| async { PocketBaseService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn replicate(&self) -> Result<Arc<ReplicateService>, ApiError> {
        self.replicate
            .get_or_try_init(|| async { ReplicateService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn slack(&self) -> Result<Arc<SlackService>, ApiError> {
        self.slack
            .get_or_try_init(|| async { SlackService::from_env().map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn telegram(&self) -> Result<Arc<TelegramService>, ApiError> {
        self.telegram
            .get_or_try_init(|| async { TelegramService::from_env().map(Arc::new) })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_configuration_fails_with_variable_name() {
        // A fresh registry in an environment without GitHub credentials must
        // surface the variable name, not panic or hang.
        std::env::remove_var("GITHUB_HOST");
        std::env::remove_var("GITHUB_API_TOKEN");

        let registry = ServiceRegistry::new();
        let err = registry.github().await.unwrap_err();
        assert!(err.to_string().contains("GITHUB_HOST"));
    }
}
