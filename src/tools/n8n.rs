//! n8n workflow and execution management tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::n8n::WorkflowPayload;
use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(ListWorkflowsTool),
        Box::new(GetWorkflowTool),
        Box::new(CreateWorkflowTool),
        Box::new(UpdateWorkflowTool),
        Box::new(DeleteWorkflowTool),
        Box::new(ActivateWorkflowTool),
        Box::new(DeactivateWorkflowTool),
        Box::new(ListExecutionsTool),
        Box::new(GetExecutionTool),
        Box::new(DeleteExecutionTool),
        Box::new(ListTagsTool),
    ]
}

/// Resolve an optional inline-or-file JSON fragment and parse it. Returns
/// `None` when neither variant was supplied.
fn optional_json_content(
    inline: Option<&str>,
    file: Option<&str>,
    field: &str,
) -> Result<Option<Value>> {
    let has_any = inline.is_some_and(|s| !s.is_empty()) || file.is_some_and(|s| !s.is_empty());
    if !has_any {
        return Ok(None);
    }
    let text = resolve_content(inline, file, field)?;
    let value = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("'{field}' is not valid JSON: {e}"))?;
    Ok(Some(value))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowIdInput {
    pub id: String,
}

fn workflow_id_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": description
            }
        },
        "required": ["id"]
    })
}

pub struct ListWorkflowsTool;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkflowsInput {
    pub active: Option<bool>,
    pub tags: Option<String>,
    pub limit: Option<u64>,
    pub cursor: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListWorkflowsTool {
    type Input = ListWorkflowsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_list_workflows",
            description: "List workflows on the n8n instance, optionally filtered by active \
                state or tags. Paginated via 'cursor'. Results are written to a temporary file \
                as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "active": {
                        "type": "boolean",
                        "description": "Only return workflows with this active state."
                    },
                    "tags": {
                        "type": "string",
                        "description": "Comma-separated list of tag names to filter by."
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 250,
                        "description": "Maximum number of workflows to return."
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor from a previous response."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "n8n",
            tool_ref: "list-workflows",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        let result = n8n
            .list_workflows(
                input.active,
                input.tags.as_deref(),
                input.limit,
                input.cursor.as_deref(),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

pub struct GetWorkflowTool;

#[async_trait::async_trait]
impl Tool for GetWorkflowTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_get_workflow",
            description: "Get a single n8n workflow by ID, including its nodes and connections. \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: workflow_id_schema("The ID of the workflow to retrieve."),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "n8n",
            tool_ref: "get-workflow",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        Ok(serde_json::to_string_pretty(&n8n.get_workflow(&input.id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowInput {
    pub name: String,
    pub nodes: Option<String>,
    pub nodes_file: Option<String>,
    pub connections: Option<String>,
    pub connections_file: Option<String>,
    pub settings: Option<String>,
}

fn workflow_piece_properties() -> serde_json::Value {
    json!({
        "nodes": {
            "type": "string",
            "description": "JSON string containing an array of node objects for the workflow."
        },
        "nodesFile": {
            "type": "string",
            "description": "Absolute path to a file containing the nodes JSON array. Use this for large node sets instead of 'nodes'."
        },
        "connections": {
            "type": "string",
            "description": "JSON string containing the connections object that defines how nodes are linked."
        },
        "connectionsFile": {
            "type": "string",
            "description": "Absolute path to a file containing the connections JSON object. Use this instead of 'connections' for large graphs."
        },
        "settings": {
            "type": "string",
            "description": "JSON string containing workflow settings."
        }
    })
}

fn workflow_payload(input_settings: Option<&str>, nodes: Option<Value>, connections: Option<Value>) -> Result<WorkflowPayload> {
    let settings = match input_settings.filter(|s| !s.is_empty()) {
        Some(text) => Some(
            serde_json::from_str(text)
                .map_err(|e| anyhow::anyhow!("'settings' is not valid JSON: {e}"))?,
        ),
        None => None,
    };
    Ok(WorkflowPayload {
        name: None,
        nodes,
        connections,
        settings,
    })
}

pub struct CreateWorkflowTool;

#[async_trait::async_trait]
impl Tool for CreateWorkflowTool {
    type Input = CreateWorkflowInput;

    fn spec(&self) -> ToolSpec {
        let mut properties = workflow_piece_properties();
        properties["name"] = json!({
            "type": "string",
            "description": "The name of the new workflow."
        });
        ToolSpec {
            name: "n8n_create_workflow",
            description: "Create a new n8n workflow. Provide the workflow name and optionally \
                its nodes, connections, and settings. The workflow is created in inactive state; \
                use n8n_activate_workflow to turn it on.",
            parameters_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let nodes = optional_json_content(
            input.nodes.as_deref(),
            input.nodes_file.as_deref(),
            "nodes",
        )?;
        let connections = optional_json_content(
            input.connections.as_deref(),
            input.connections_file.as_deref(),
            "connections",
        )?;
        let mut payload = workflow_payload(input.settings.as_deref(), nodes, connections)?;
        payload.name = Some(input.name.clone());

        let n8n = services.n8n().await?;
        let workflow = n8n.create_workflow(payload).await?;
        Ok(format!(
            "Workflow created successfully. ID: {}, Name: {}",
            workflow["id"].as_str().unwrap_or_default(),
            workflow["name"].as_str().unwrap_or(&input.name)
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowInput {
    pub id: String,
    pub name: Option<String>,
    pub nodes: Option<String>,
    pub nodes_file: Option<String>,
    pub connections: Option<String>,
    pub connections_file: Option<String>,
    pub settings: Option<String>,
}

pub struct UpdateWorkflowTool;

#[async_trait::async_trait]
impl Tool for UpdateWorkflowTool {
    type Input = UpdateWorkflowInput;

    fn spec(&self) -> ToolSpec {
        let mut properties = workflow_piece_properties();
        properties["id"] = json!({
            "type": "string",
            "description": "The ID of the workflow to update."
        });
        properties["name"] = json!({
            "type": "string",
            "description": "New name for the workflow."
        });
        ToolSpec {
            name: "n8n_update_workflow",
            description: "Update an existing n8n workflow. Only the provided pieces (name, \
                nodes, connections, settings) are sent; use n8n_get_workflow first to fetch the \
                current definition.",
            parameters_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["id"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let nodes = optional_json_content(
            input.nodes.as_deref(),
            input.nodes_file.as_deref(),
            "nodes",
        )?;
        let connections = optional_json_content(
            input.connections.as_deref(),
            input.connections_file.as_deref(),
            "connections",
        )?;
        let mut payload = workflow_payload(input.settings.as_deref(), nodes, connections)?;
        payload.name = input.name.clone();

        let n8n = services.n8n().await?;
        let workflow = n8n.update_workflow(&input.id, payload).await?;
        Ok(format!(
            "Workflow updated successfully. ID: {}, Name: {}",
            workflow["id"].as_str().unwrap_or(&input.id),
            workflow["name"].as_str().unwrap_or_default()
        ))
    }
}

pub struct DeleteWorkflowTool;

#[async_trait::async_trait]
impl Tool for DeleteWorkflowTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_delete_workflow",
            description: "Delete an n8n workflow by ID. This cannot be undone.",
            parameters_schema: workflow_id_schema("The ID of the workflow to delete."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        n8n.delete_workflow(&input.id).await?;
        Ok(format!("Workflow {} deleted successfully.", input.id))
    }
}

pub struct ActivateWorkflowTool;

#[async_trait::async_trait]
impl Tool for ActivateWorkflowTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_activate_workflow",
            description: "Activate an n8n workflow so its triggers start running.",
            parameters_schema: workflow_id_schema("The ID of the workflow to activate."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        n8n.activate_workflow(&input.id).await?;
        Ok(format!("Workflow {} activated successfully.", input.id))
    }
}

pub struct DeactivateWorkflowTool;

#[async_trait::async_trait]
impl Tool for DeactivateWorkflowTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_deactivate_workflow",
            description: "Deactivate an n8n workflow so its triggers stop running.",
            parameters_schema: workflow_id_schema("The ID of the workflow to deactivate."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        n8n.deactivate_workflow(&input.id).await?;
        Ok(format!("Workflow {} deactivated successfully.", input.id))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExecutionsInput {
    pub workflow_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub cursor: Option<String>,
}

pub struct ListExecutionsTool;

#[async_trait::async_trait]
impl Tool for ListExecutionsTool {
    type Input = ListExecutionsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_list_executions",
            description: "List workflow executions, optionally filtered by workflow and status. \
                Paginated via 'cursor'. Results are written to a temporary file as JSON and the \
                file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "Only list executions of this workflow."
                    },
                    "status": {
                        "type": "string",
                        "enum": ["error", "success", "waiting"],
                        "description": "Only list executions with this status."
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 250,
                        "description": "Maximum number of executions to return."
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor from a previous response."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "n8n",
            tool_ref: "list-executions",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        let result = n8n
            .list_executions(
                input.workflow_id.as_deref(),
                input.status.as_deref(),
                input.limit,
                input.cursor.as_deref(),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

pub struct GetExecutionTool;

#[async_trait::async_trait]
impl Tool for GetExecutionTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_get_execution",
            description: "Get a single workflow execution by ID, including its run data. \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: workflow_id_schema("The ID of the execution to retrieve."),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "n8n",
            tool_ref: "get-execution",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        Ok(serde_json::to_string_pretty(&n8n.get_execution(&input.id).await?)?)
    }
}

pub struct DeleteExecutionTool;

#[async_trait::async_trait]
impl Tool for DeleteExecutionTool {
    type Input = WorkflowIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_delete_execution",
            description: "Delete a workflow execution record by ID.",
            parameters_schema: workflow_id_schema("The ID of the execution to delete."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        n8n.delete_execution(&input.id).await?;
        Ok(format!("Execution {} deleted successfully.", input.id))
    }
}

#[derive(Deserialize)]
pub struct EmptyInput {}

pub struct ListTagsTool;

#[async_trait::async_trait]
impl Tool for ListTagsTool {
    type Input = EmptyInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "n8n_list_tags",
            description: "List all workflow tags on the n8n instance. Results are written to a \
                temporary file as JSON and the file path is returned.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Spooled {
            module_ref: "n8n",
            tool_ref: "list-tags",
        }
    }

    async fn execute(&self, services: &ServiceRegistry, _input: Self::Input) -> Result<String> {
        let n8n = services.n8n().await?;
        Ok(serde_json::to_string_pretty(&n8n.list_tags().await?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;

    #[tokio::test]
    async fn test_create_workflow_rejects_malformed_nodes_json() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &CreateWorkflowTool,
            &services,
            json!({
                "name": "My flow",
                "nodes": "not json",
            }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'nodes' is not valid JSON"));
    }

    #[tokio::test]
    async fn test_create_workflow_rejects_conflicting_nodes_sources() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &CreateWorkflowTool,
            &services,
            json!({
                "name": "My flow",
                "nodes": "[]",
                "nodesFile": "/tmp/nodes.json",
            }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'nodes'"));
        assert!(result.text.contains("'nodesFile'"));
    }

    #[test]
    fn test_optional_json_content_absent_is_none() {
        assert!(optional_json_content(None, None, "nodes").unwrap().is_none());
        assert!(optional_json_content(Some(""), Some(""), "nodes")
            .unwrap()
            .is_none());
    }
}
