//! GitHub pull-request review tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(GetPullRequestTool),
        Box::new(GetPrDiffTool),
        Box::new(AddPrCommentTool),
        Box::new(SubmitReviewTool),
    ]
}

fn pr_locator_properties() -> serde_json::Value {
    json!({
        "owner": {
            "type": "string",
            "description": "The account owner of the repository. Example: 'platform' for platform/playground"
        },
        "repo": {
            "type": "string",
            "description": "The name of the repository without the .git extension. Example: 'playground'"
        },
        "pullNumber": {
            "type": "integer",
            "minimum": 1,
            "description": "The pull request number. Example: 1"
        }
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestLocator {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
}

pub struct GetPullRequestTool;

#[async_trait::async_trait]
impl Tool for GetPullRequestTool {
    type Input = PullRequestLocator;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "github_get_pull_request",
            description: "Get a GitHub pull request by number, including metadata (title, body, \
                author, state, reviewers, merge status) AND all review comments. Use this as the \
                first step when reviewing a PR. Use github_get_pr_diff to see the actual code \
                changes. Results are written to a temporary file as JSON and the file path is \
                returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": pr_locator_properties(),
                "required": ["owner", "repo", "pullNumber"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "github",
            tool_ref: "get-pull-request",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let github = services.github().await?;
        let (pull_request, comments) = tokio::try_join!(
            github.get_pull_request(&input.owner, &input.repo, input.pull_number),
            github.get_pull_request_comments(&input.owner, &input.repo, input.pull_number),
        )?;

        Ok(serde_json::to_string_pretty(&json!({
            "pullRequest": pull_request,
            "comments": comments,
        }))?)
    }
}

pub struct GetPrDiffTool;

#[async_trait::async_trait]
impl Tool for GetPrDiffTool {
    type Input = PullRequestLocator;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "github_get_pr_diff",
            description: "Get the unified diff of a GitHub pull request. Returns the raw diff \
                text showing all file changes. Use this to review the actual code changes in a \
                PR; use github_get_pull_request first to get PR metadata and existing comments. \
                Results are written to a temporary file and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": pr_locator_properties(),
                "required": ["owner", "repo", "pullNumber"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "github",
            tool_ref: "get-pr-diff",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let github = services.github().await?;
        Ok(github
            .get_pull_request_diff(&input.owner, &input.repo, input.pull_number)
            .await?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPrCommentInput {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
    pub body: Option<String>,
    pub body_file: Option<String>,
    pub commit_id: String,
    pub path: String,
    pub line: u64,
    #[serde(default = "default_side")]
    pub side: String,
}

fn default_side() -> String {
    "RIGHT".to_string()
}

pub struct AddPrCommentTool;

#[async_trait::async_trait]
impl Tool for AddPrCommentTool {
    type Input = AddPrCommentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "github_add_pr_comment",
            description: "Add an inline review comment on a specific file and line in a GitHub \
                pull request. Use this to provide feedback on specific code changes. Requires \
                the commit SHA (from github_get_pull_request), file path, and line number.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "owner": pr_locator_properties()["owner"],
                    "repo": pr_locator_properties()["repo"],
                    "pullNumber": pr_locator_properties()["pullNumber"],
                    "body": {
                        "type": "string",
                        "description": "The text of the review comment. Supports GitHub Markdown."
                    },
                    "bodyFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the comment text. Use this for large comments instead of 'body'."
                    },
                    "commitId": {
                        "type": "string",
                        "description": "The SHA of the commit to comment on. Get this from github_get_pull_request (head.sha field)."
                    },
                    "path": {
                        "type": "string",
                        "description": "The relative path of the file to comment on. Example: 'src/main.rs'"
                    },
                    "line": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "The line number in the diff to attach the comment to, in the NEW version of the file."
                    },
                    "side": {
                        "type": "string",
                        "enum": ["LEFT", "RIGHT"],
                        "default": "RIGHT",
                        "description": "Which side of the diff to comment on. 'RIGHT' (default) for the new version, 'LEFT' for the old."
                    }
                },
                "required": ["owner", "repo", "pullNumber", "commitId", "path", "line"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let body = resolve_content(input.body.as_deref(), input.body_file.as_deref(), "body")?;

        let github = services.github().await?;
        let comment = github
            .add_pull_request_comment(
                &input.owner,
                &input.repo,
                input.pull_number,
                &body,
                &input.commit_id,
                &input.path,
                input.line,
                &input.side,
            )
            .await?;

        Ok(format!(
            "Comment added successfully. ID: {}, URL: {}",
            comment["id"],
            comment["html_url"].as_str().unwrap_or_default()
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewInput {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
    pub event: String,
    pub body: Option<String>,
    pub body_file: Option<String>,
}

pub struct SubmitReviewTool;

#[async_trait::async_trait]
impl Tool for SubmitReviewTool {
    type Input = SubmitReviewInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "github_submit_review",
            description: "Submit a review on a GitHub pull request. Use this to approve, request \
                changes, or leave a general comment on a PR. For inline code comments, use \
                github_add_pr_comment instead.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "owner": pr_locator_properties()["owner"],
                    "repo": pr_locator_properties()["repo"],
                    "pullNumber": pr_locator_properties()["pullNumber"],
                    "event": {
                        "type": "string",
                        "enum": ["APPROVE", "REQUEST_CHANGES", "COMMENT"],
                        "description": "The review action to perform. 'APPROVE' approves the PR for merging, 'REQUEST_CHANGES' blocks it until addressed, 'COMMENT' leaves general feedback."
                    },
                    "body": {
                        "type": "string",
                        "description": "The body text of the review. Required for REQUEST_CHANGES, optional otherwise. Supports GitHub Markdown."
                    },
                    "bodyFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the review body. Use this for large reviews instead of 'body'."
                    }
                },
                "required": ["owner", "repo", "pullNumber", "event"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let has_body = input.body.as_deref().is_some_and(|s| !s.is_empty())
            || input.body_file.as_deref().is_some_and(|s| !s.is_empty());
        let body = if has_body {
            Some(resolve_content(
                input.body.as_deref(),
                input.body_file.as_deref(),
                "body",
            )?)
        } else if input.event == "REQUEST_CHANGES" {
            anyhow::bail!(
                "Body is required when requesting changes. Provide a 'body' or 'bodyFile' \
                 explaining what changes are needed."
            );
        } else {
            None
        };

        let github = services.github().await?;
        let review = github
            .submit_review(
                &input.owner,
                &input.repo,
                input.pull_number,
                &input.event,
                body.as_deref(),
            )
            .await?;

        let verb = match input.event.as_str() {
            "APPROVE" => "approved",
            "REQUEST_CHANGES" => "requested changes on",
            _ => "commented on",
        };

        Ok(format!(
            "Review {} PR successfully. Review ID: {}, State: {}, URL: {}",
            verb,
            review["id"],
            review["state"].as_str().unwrap_or_default(),
            review["html_url"].as_str().unwrap_or_default()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_review_requires_body_for_request_changes() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &SubmitReviewTool,
            &services,
            json!({
                "owner": "o",
                "repo": "r",
                "pullNumber": 1,
                "event": "REQUEST_CHANGES",
            }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("Body is required"));
    }

    #[tokio::test]
    async fn test_add_pr_comment_rejects_conflicting_body_sources() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &AddPrCommentTool,
            &services,
            json!({
                "owner": "o",
                "repo": "r",
                "pullNumber": 1,
                "body": "inline",
                "bodyFile": "/tmp/body.md",
                "commitId": "abc123",
                "path": "src/main.rs",
                "line": 10,
            }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'body'"));
        assert!(result.text.contains("'bodyFile'"));
    }

    #[test]
    fn test_specs_use_camel_case_wire_names() {
        let spec = Tool::spec(&AddPrCommentTool);
        let properties = &spec.parameters_schema["properties"];
        assert!(properties.get("pullNumber").is_some());
        assert!(properties.get("bodyFile").is_some());
        assert!(properties.get("commitId").is_some());
    }
}
