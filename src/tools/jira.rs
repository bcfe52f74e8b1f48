//! Jira issue lookup tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};

/// When set to `true`, rich Jira field objects are collapsed to their
/// display names before the response is spooled. A per-deployment
/// convenience, off by default; the raw response passes through otherwise.
const SIMPLIFY_ENV: &str = "TOOLBRIDGE_JIRA_SIMPLIFY";

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![Box::new(GetIssueTool), Box::new(SearchIssuesTool)]
}

fn simplify_enabled() -> bool {
    std::env::var(SIMPLIFY_ENV)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Collapse rich Jira field objects to a human-readable scalar where one is
/// evident: objects exposing `displayName`, `name`, or `value` become that
/// string; arrays are simplified element-wise; everything else is untouched.
fn simplify_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            for key in ["displayName", "name", "value"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return Value::String(s.clone());
                }
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), simplify_fields(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(simplify_fields).collect()),
        other => other.clone(),
    }
}

fn simplify_issue(mut issue: Value) -> Value {
    if let Some(fields) = issue.get_mut("fields") {
        *fields = simplify_fields(fields);
    }
    issue
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIssueInput {
    pub issue_id_or_key: String,
    #[serde(default = "default_get_fields")]
    pub fields: String,
    #[serde(default = "default_get_expand")]
    pub expand: String,
}

fn default_get_fields() -> String {
    "*navigable".to_string()
}

fn default_get_expand() -> String {
    "renderedFields,names,changelog".to_string()
}

pub struct GetIssueTool;

#[async_trait::async_trait]
impl Tool for GetIssueTool {
    type Input = GetIssueInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "jira_get_issue",
            description: "Get a single Jira issue by its ID or key (e.g., 'PROJ-123'). Use this \
                when you already know the specific issue key/ID; use jira_search_issues when you \
                need to find issues by criteria. Results are written to a temporary file as JSON \
                and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "issueIdOrKey": {
                        "type": "string",
                        "description": "The ID or key of the issue to retrieve. Example: 'PROJ-123' or '10001'"
                    },
                    "fields": {
                        "type": "string",
                        "default": "*navigable",
                        "description": "Comma-separated list of field IDs to return. Defaults to '*navigable'. Use '*all' for all fields."
                    },
                    "expand": {
                        "type": "string",
                        "default": "renderedFields,names,changelog",
                        "description": "Comma-separated list of entities to expand. Defaults to 'renderedFields,names,changelog'."
                    }
                },
                "required": ["issueIdOrKey"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "jira",
            tool_ref: "get-issue",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let jira = services.jira().await?;
        let mut issue = jira
            .get_issue(&input.issue_id_or_key, &input.fields, &input.expand)
            .await?;
        if simplify_enabled() {
            issue = simplify_issue(issue);
        }
        Ok(serde_json::to_string_pretty(&issue)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIssuesInput {
    pub jql: String,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u64,
    #[serde(default = "default_search_fields")]
    pub fields: String,
    #[serde(default = "default_search_expand")]
    pub expand: String,
}

fn default_max_results() -> u64 {
    50
}

fn default_search_fields() -> String {
    "summary,issuetype,status,priority,assignee,reporter,created,updated,project".to_string()
}

fn default_search_expand() -> String {
    "renderedFields,names".to_string()
}

pub struct SearchIssuesTool;

#[async_trait::async_trait]
impl Tool for SearchIssuesTool {
    type Input = SearchIssuesInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "jira_search_issues",
            description: "Search for Jira issues using JQL (Jira Query Language). Use this when \
                you need to find issues by criteria; use jira_get_issue if you already know the \
                specific issue key/ID. Returns matching issues with their details. Results are \
                written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "jql": {
                        "type": "string",
                        "description": "JQL query string to search for issues. Example: 'project = PROJ AND status = Open'"
                    },
                    "startAt": {
                        "type": "integer",
                        "minimum": 0,
                        "default": 0,
                        "description": "Index of the first result to return (0-based pagination)"
                    },
                    "maxResults": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 100,
                        "default": 50,
                        "description": "Maximum number of results to return (1-100)"
                    },
                    "fields": {
                        "type": "string",
                        "default": "summary,issuetype,status,priority,assignee,reporter,created,updated,project",
                        "description": "Comma-separated list of fields to include. Use '*all' for all fields or '*navigable' for navigable fields."
                    },
                    "expand": {
                        "type": "string",
                        "default": "renderedFields,names",
                        "description": "Comma-separated list of expand options for additional issue data."
                    }
                },
                "required": ["jql"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "jira",
            tool_ref: "search-issues",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let jira = services.jira().await?;
        let mut result = jira
            .search_issues(
                &input.jql,
                input.start_at,
                input.max_results,
                &input.fields,
                &input.expand,
            )
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Error searching issues with JQL '{}': {}\n\n\
                     Troubleshooting:\n\
                     - Verify the JQL syntax (example: 'project = PROJ AND status = Open').\n\
                     - If this is a 401/403, verify JIRA_HOST, JIRA_EMAIL_ADDRESS, and \
                     JIRA_API_TOKEN.",
                    input.jql,
                    e
                )
            })?;

        if simplify_enabled() {
            if let Some(issues) = result.get_mut("issues").and_then(Value::as_array_mut) {
                for issue in issues.iter_mut() {
                    *issue = simplify_issue(issue.take());
                }
            }
        }

        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_collapses_display_names() {
        let issue = json!({
            "key": "PROJ-1",
            "fields": {
                "assignee": { "accountId": "a1", "displayName": "Dana Example" },
                "status": { "id": "3", "name": "In Progress" },
                "priority": { "value": "High" },
                "summary": "Fix the flaky test",
                "labels": [{ "name": "ci" }, "raw-label"]
            }
        });
        let simplified = simplify_issue(issue);
        let fields = &simplified["fields"];
        assert_eq!(fields["assignee"], "Dana Example");
        assert_eq!(fields["status"], "In Progress");
        assert_eq!(fields["priority"], "High");
        assert_eq!(fields["summary"], "Fix the flaky test");
        assert_eq!(fields["labels"][0], "ci");
        assert_eq!(fields["labels"][1], "raw-label");
    }

    #[test]
    fn test_simplify_leaves_plain_objects_alone() {
        let issue = json!({
            "key": "PROJ-2",
            "fields": {
                "votes": { "votes": 3, "hasVoted": false }
            }
        });
        let simplified = simplify_issue(issue);
        assert_eq!(simplified["fields"]["votes"]["votes"], 3);
    }

    #[test]
    fn test_search_defaults() {
        let input: SearchIssuesInput =
            serde_json::from_value(json!({ "jql": "project = X" })).unwrap();
        assert_eq!(input.start_at, 0);
        assert_eq!(input.max_results, 50);
        assert!(input.fields.contains("summary"));
        assert_eq!(input.expand, "renderedFields,names");
    }
}
