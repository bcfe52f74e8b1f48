//! PocketBase administration tools: collections, records, settings, logs,
//! and file access.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(ListCollectionsTool),
        Box::new(GetCollectionTool),
        Box::new(CreateCollectionTool),
        Box::new(UpdateCollectionTool),
        Box::new(DeleteCollectionTool),
        Box::new(TruncateCollectionTool),
        Box::new(ListRecordsTool),
        Box::new(GetRecordTool),
        Box::new(CreateRecordTool),
        Box::new(UpdateRecordTool),
        Box::new(DeleteRecordTool),
        Box::new(GetSettingsTool),
        Box::new(UpdateSettingsTool),
        Box::new(TestS3Tool),
        Box::new(TestEmailTool),
        Box::new(ListLogsTool),
        Box::new(GetLogTool),
        Box::new(GetLogStatsTool),
        Box::new(GetFileUrlTool),
        Box::new(GenerateFileTokenTool),
        Box::new(ImpersonateUserTool),
    ]
}

fn spooled(tool_ref: &'static str) -> OutputMode {
    OutputMode::Spooled {
        module_ref: "pocketbase",
        tool_ref,
    }
}

fn parse_json_text(text: &str, field: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| anyhow::anyhow!("'{field}' is not valid JSON: {e}"))
}

#[derive(Deserialize)]
pub struct EmptyInput {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIdInput {
    pub collection_id_or_name: String,
}

fn collection_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "collectionIdOrName": {
                "type": "string",
                "description": description
            }
        },
        "required": ["collectionIdOrName"]
    })
}

pub struct ListCollectionsTool;

#[async_trait::async_trait]
impl Tool for ListCollectionsTool {
    type Input = EmptyInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_list_collections",
            description: "List all collections on the PocketBase instance with their schemas. \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-collections")
    }

    async fn execute(&self, services: &ServiceRegistry, _input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        Ok(serde_json::to_string_pretty(&pocketbase.list_collections().await?)?)
    }
}

pub struct GetCollectionTool;

#[async_trait::async_trait]
impl Tool for GetCollectionTool {
    type Input = CollectionIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_collection",
            description: "Get a single PocketBase collection by ID or name, including its field \
                schema, rules, and indexes. Results are written to a temporary file as JSON and \
                the file path is returned.",
            parameters_schema: collection_id_schema("The ID or name of the collection to retrieve."),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-collection")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        Ok(serde_json::to_string_pretty(
            &pocketbase.get_collection(&input.collection_id_or_name).await?,
        )?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionInput {
    pub name: String,
    #[serde(default = "default_collection_type")]
    pub r#type: String,
    pub schema: Option<String>,
    pub schema_file: Option<String>,
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

fn default_collection_type() -> String {
    "base".to_string()
}

fn rule_properties() -> Value {
    json!({
        "listRule": {
            "type": "string",
            "description": "API rule expression controlling list access. Empty string means admins only."
        },
        "viewRule": {
            "type": "string",
            "description": "API rule expression controlling view access."
        },
        "createRule": {
            "type": "string",
            "description": "API rule expression controlling record creation."
        },
        "updateRule": {
            "type": "string",
            "description": "API rule expression controlling record updates."
        },
        "deleteRule": {
            "type": "string",
            "description": "API rule expression controlling record deletion."
        }
    })
}

fn apply_rules(data: &mut Value, input_rules: [(&str, &Option<String>); 5]) {
    for (key, rule) in input_rules {
        if let Some(rule) = rule {
            data[key] = json!(rule);
        }
    }
}

pub struct CreateCollectionTool;

#[async_trait::async_trait]
impl Tool for CreateCollectionTool {
    type Input = CreateCollectionInput;

    fn spec(&self) -> ToolSpec {
        let mut properties = rule_properties();
        properties["name"] = json!({
            "type": "string",
            "description": "The name of the new collection."
        });
        properties["type"] = json!({
            "type": "string",
            "enum": ["base", "auth", "view"],
            "default": "base",
            "description": "The collection type."
        });
        properties["schema"] = json!({
            "type": "string",
            "description": "JSON string containing the array of field definitions for the collection."
        });
        properties["schemaFile"] = json!({
            "type": "string",
            "description": "Absolute path to a file containing the field definitions JSON. Use this for large schemas instead of 'schema'."
        });
        ToolSpec {
            name: "pocketbase_create_collection",
            description: "Create a new PocketBase collection with the given field schema and \
                optional API rules.",
            parameters_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let mut data = json!({
            "name": input.name,
            "type": input.r#type,
        });
        let has_schema = input.schema.as_deref().is_some_and(|s| !s.is_empty())
            || input.schema_file.as_deref().is_some_and(|s| !s.is_empty());
        if has_schema {
            let text = resolve_content(
                input.schema.as_deref(),
                input.schema_file.as_deref(),
                "schema",
            )?;
            data["fields"] = parse_json_text(&text, "schema")?;
        }
        apply_rules(
            &mut data,
            [
                ("listRule", &input.list_rule),
                ("viewRule", &input.view_rule),
                ("createRule", &input.create_rule),
                ("updateRule", &input.update_rule),
                ("deleteRule", &input.delete_rule),
            ],
        );

        let pocketbase = services.pocketbase().await?;
        let collection = pocketbase.create_collection(data).await?;
        Ok(format!(
            "Collection created successfully. ID: {}, Name: {}",
            collection["id"].as_str().unwrap_or_default(),
            collection["name"].as_str().unwrap_or_default()
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionInput {
    pub collection_id_or_name: String,
    pub name: Option<String>,
    pub schema: Option<String>,
    pub schema_file: Option<String>,
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

pub struct UpdateCollectionTool;

#[async_trait::async_trait]
impl Tool for UpdateCollectionTool {
    type Input = UpdateCollectionInput;

    fn spec(&self) -> ToolSpec {
        let mut properties = rule_properties();
        properties["collectionIdOrName"] = json!({
            "type": "string",
            "description": "The ID or name of the collection to update."
        });
        properties["name"] = json!({
            "type": "string",
            "description": "New name for the collection."
        });
        properties["schema"] = json!({
            "type": "string",
            "description": "JSON string containing the full replacement array of field definitions."
        });
        properties["schemaFile"] = json!({
            "type": "string",
            "description": "Absolute path to a file containing the field definitions JSON. Use this for large schemas instead of 'schema'."
        });
        ToolSpec {
            name: "pocketbase_update_collection",
            description: "Update a PocketBase collection's name, field schema, or API rules. \
                Only the provided pieces are changed.",
            parameters_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["collectionIdOrName"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let mut data = json!({});
        if let Some(name) = &input.name {
            data["name"] = json!(name);
        }
        let has_schema = input.schema.as_deref().is_some_and(|s| !s.is_empty())
            || input.schema_file.as_deref().is_some_and(|s| !s.is_empty());
        if has_schema {
            let text = resolve_content(
                input.schema.as_deref(),
                input.schema_file.as_deref(),
                "schema",
            )?;
            data["fields"] = parse_json_text(&text, "schema")?;
        }
        apply_rules(
            &mut data,
            [
                ("listRule", &input.list_rule),
                ("viewRule", &input.view_rule),
                ("createRule", &input.create_rule),
                ("updateRule", &input.update_rule),
                ("deleteRule", &input.delete_rule),
            ],
        );

        let pocketbase = services.pocketbase().await?;
        let collection = pocketbase
            .update_collection(&input.collection_id_or_name, data)
            .await?;
        Ok(format!(
            "Collection updated successfully. ID: {}, Name: {}",
            collection["id"].as_str().unwrap_or_default(),
            collection["name"].as_str().unwrap_or_default()
        ))
    }
}

pub struct DeleteCollectionTool;

#[async_trait::async_trait]
impl Tool for DeleteCollectionTool {
    type Input = CollectionIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_delete_collection",
            description: "Delete a PocketBase collection and all of its records. This cannot be \
                undone.",
            parameters_schema: collection_id_schema("The ID or name of the collection to delete."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase
            .delete_collection(&input.collection_id_or_name)
            .await?;
        Ok(format!(
            "Collection {} deleted successfully.",
            input.collection_id_or_name
        ))
    }
}

pub struct TruncateCollectionTool;

#[async_trait::async_trait]
impl Tool for TruncateCollectionTool {
    type Input = CollectionIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_truncate_collection",
            description: "Delete all records of a PocketBase collection while keeping the \
                collection itself. This cannot be undone.",
            parameters_schema: collection_id_schema("The ID or name of the collection to truncate."),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase
            .truncate_collection(&input.collection_id_or_name)
            .await?;
        Ok(format!(
            "Collection {} truncated successfully.",
            input.collection_id_or_name
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsInput {
    pub collection: String,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    30
}

pub struct ListRecordsTool;

#[async_trait::async_trait]
impl Tool for ListRecordsTool {
    type Input = ListRecordsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_list_records",
            description: "List records of a PocketBase collection with optional filter, sort, \
                expand, and field selection. Paginated. Results are written to a temporary file \
                as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the collection to list records from."
                    },
                    "filter": {
                        "type": "string",
                        "description": "PocketBase filter expression. Example: \"status = 'active' && created >= '2024-01-01'\""
                    },
                    "sort": {
                        "type": "string",
                        "description": "Comma-separated sort fields; prefix with '-' for descending. Example: '-created,title'"
                    },
                    "expand": {
                        "type": "string",
                        "description": "Comma-separated relation fields to expand."
                    },
                    "fields": {
                        "type": "string",
                        "description": "Comma-separated fields to include in the response."
                    },
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 1,
                        "description": "Page number (1-based)."
                    },
                    "perPage": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 500,
                        "default": 30,
                        "description": "Records per page (1-500)."
                    }
                },
                "required": ["collection"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-records")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        let query = crate::services::pocketbase::ListRecordsQuery {
            filter: input.filter,
            sort: input.sort,
            expand: input.expand,
            fields: input.fields,
            page: input.page,
            per_page: input.per_page,
        };
        let result = pocketbase.list_records(&input.collection, query).await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordInput {
    pub collection: String,
    pub record_id: String,
    pub expand: Option<String>,
    pub fields: Option<String>,
}

pub struct GetRecordTool;

#[async_trait::async_trait]
impl Tool for GetRecordTool {
    type Input = GetRecordInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_record",
            description: "Get a single PocketBase record by collection and record ID. Results \
                are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the record's collection."
                    },
                    "recordId": {
                        "type": "string",
                        "description": "The ID of the record to retrieve."
                    },
                    "expand": {
                        "type": "string",
                        "description": "Comma-separated relation fields to expand."
                    },
                    "fields": {
                        "type": "string",
                        "description": "Comma-separated fields to include in the response."
                    }
                },
                "required": ["collection", "recordId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-record")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        let record = pocketbase
            .get_record(
                &input.collection,
                &input.record_id,
                input.expand.as_deref(),
                input.fields.as_deref(),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordInput {
    pub collection: String,
    pub data: Option<String>,
    pub data_file: Option<String>,
}

pub struct CreateRecordTool;

#[async_trait::async_trait]
impl Tool for CreateRecordTool {
    type Input = CreateRecordInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_create_record",
            description: "Create a record in a PocketBase collection from a JSON object of \
                field values.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the collection to create the record in."
                    },
                    "data": {
                        "type": "string",
                        "description": "JSON string with the record's field values. Example: '{\"title\": \"Hello\"}'"
                    },
                    "dataFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the record JSON. Use this for large records instead of 'data'."
                    }
                },
                "required": ["collection"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.data.as_deref(), input.data_file.as_deref(), "data")?;
        let data = parse_json_text(&text, "data")?;

        let pocketbase = services.pocketbase().await?;
        let record = pocketbase.create_record(&input.collection, data).await?;
        Ok(format!(
            "Record created successfully. ID: {}",
            record["id"].as_str().unwrap_or_default()
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordInput {
    pub collection: String,
    pub record_id: String,
    pub data: Option<String>,
    pub data_file: Option<String>,
}

pub struct UpdateRecordTool;

#[async_trait::async_trait]
impl Tool for UpdateRecordTool {
    type Input = UpdateRecordInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_update_record",
            description: "Update a PocketBase record with a JSON object of changed field values.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the record's collection."
                    },
                    "recordId": {
                        "type": "string",
                        "description": "The ID of the record to update."
                    },
                    "data": {
                        "type": "string",
                        "description": "JSON string with the changed field values."
                    },
                    "dataFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the changes JSON. Use this for large updates instead of 'data'."
                    }
                },
                "required": ["collection", "recordId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(input.data.as_deref(), input.data_file.as_deref(), "data")?;
        let data = parse_json_text(&text, "data")?;

        let pocketbase = services.pocketbase().await?;
        let record = pocketbase
            .update_record(&input.collection, &input.record_id, data)
            .await?;
        Ok(format!(
            "Record updated successfully. ID: {}",
            record["id"].as_str().unwrap_or(&input.record_id)
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordInput {
    pub collection: String,
    pub record_id: String,
}

pub struct DeleteRecordTool;

#[async_trait::async_trait]
impl Tool for DeleteRecordTool {
    type Input = DeleteRecordInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_delete_record",
            description: "Delete a PocketBase record by collection and record ID. This cannot \
                be undone.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the record's collection."
                    },
                    "recordId": {
                        "type": "string",
                        "description": "The ID of the record to delete."
                    }
                },
                "required": ["collection", "recordId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase
            .delete_record(&input.collection, &input.record_id)
            .await?;
        Ok(format!("Record {} deleted successfully.", input.record_id))
    }
}

pub struct GetSettingsTool;

#[async_trait::async_trait]
impl Tool for GetSettingsTool {
    type Input = EmptyInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_settings",
            description: "Get the PocketBase instance settings (SMTP, S3, backups, etc.). \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-settings")
    }

    async fn execute(&self, services: &ServiceRegistry, _input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        Ok(serde_json::to_string_pretty(&pocketbase.get_settings().await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    pub settings: Option<String>,
    pub settings_file: Option<String>,
}

pub struct UpdateSettingsTool;

#[async_trait::async_trait]
impl Tool for UpdateSettingsTool {
    type Input = UpdateSettingsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_update_settings",
            description: "Update PocketBase instance settings with a partial JSON object. Use \
                pocketbase_get_settings first to inspect the current values.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "settings": {
                        "type": "string",
                        "description": "JSON string with the settings fields to change."
                    },
                    "settingsFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the settings JSON. Use this for large payloads instead of 'settings'."
                    }
                }
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let text = resolve_content(
            input.settings.as_deref(),
            input.settings_file.as_deref(),
            "settings",
        )?;
        let data = parse_json_text(&text, "settings")?;

        let pocketbase = services.pocketbase().await?;
        pocketbase.update_settings(data).await?;
        Ok("Settings updated successfully.".to_string())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestS3Input {
    #[serde(default = "default_filesystem")]
    pub filesystem: String,
}

fn default_filesystem() -> String {
    "storage".to_string()
}

pub struct TestS3Tool;

#[async_trait::async_trait]
impl Tool for TestS3Tool {
    type Input = TestS3Input;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_test_s3",
            description: "Test the PocketBase S3 storage connection for the given filesystem.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "filesystem": {
                        "type": "string",
                        "enum": ["storage", "backups"],
                        "default": "storage",
                        "description": "Which S3 filesystem to test."
                    }
                }
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase.test_s3(&input.filesystem).await?;
        Ok(format!(
            "S3 connection for '{}' verified successfully.",
            input.filesystem
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailInput {
    pub email: String,
    #[serde(default = "default_email_template")]
    pub template: String,
}

fn default_email_template() -> String {
    "verification".to_string()
}

pub struct TestEmailTool;

#[async_trait::async_trait]
impl Tool for TestEmailTool {
    type Input = TestEmailInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_test_email",
            description: "Send a test email through the PocketBase SMTP configuration.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "The address to send the test email to."
                    },
                    "template": {
                        "type": "string",
                        "enum": ["verification", "password-reset", "email-change"],
                        "default": "verification",
                        "description": "Which email template to send."
                    }
                },
                "required": ["email"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase.test_email(&input.email, &input.template).await?;
        Ok(format!("Test email sent to {}.", input.email))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLogsInput {
    pub filter: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

pub struct ListLogsTool;

#[async_trait::async_trait]
impl Tool for ListLogsTool {
    type Input = ListLogsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_list_logs",
            description: "List PocketBase request logs, optionally filtered. Paginated. Results \
                are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Log filter expression. Example: \"level >= 0 && data.status >= 400\""
                    },
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 1,
                        "description": "Page number (1-based)."
                    },
                    "perPage": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 500,
                        "default": 30,
                        "description": "Logs per page."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-logs")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        let result = pocketbase
            .list_logs(input.filter.as_deref(), input.page, input.per_page)
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogInput {
    pub log_id: String,
}

pub struct GetLogTool;

#[async_trait::async_trait]
impl Tool for GetLogTool {
    type Input = GetLogInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_log",
            description: "Get a single PocketBase log entry by ID. Results are written to a \
                temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "logId": {
                        "type": "string",
                        "description": "The ID of the log entry to retrieve."
                    }
                },
                "required": ["logId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-log")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        Ok(serde_json::to_string_pretty(&pocketbase.get_log(&input.log_id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogStatsInput {
    pub filter: Option<String>,
}

pub struct GetLogStatsTool;

#[async_trait::async_trait]
impl Tool for GetLogStatsTool {
    type Input = GetLogStatsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_log_stats",
            description: "Get hourly aggregated PocketBase log statistics, optionally filtered. \
                Results are written to a temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Log filter expression applied before aggregation."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-log-stats")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        let stats = pocketbase.get_log_stats(input.filter.as_deref()).await?;
        Ok(serde_json::to_string_pretty(&stats)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileUrlInput {
    pub collection: String,
    pub record_id: String,
    pub filename: String,
    pub thumb: Option<String>,
    pub token: Option<String>,
}

pub struct GetFileUrlTool;

#[async_trait::async_trait]
impl Tool for GetFileUrlTool {
    type Input = GetFileUrlInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_get_file_url",
            description: "Build the public URL of a file stored on a PocketBase record, \
                optionally with a thumbnail size and a file access token (see \
                pocketbase_generate_file_token for protected files). No request is made.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the record's collection."
                    },
                    "recordId": {
                        "type": "string",
                        "description": "The ID of the record holding the file."
                    },
                    "filename": {
                        "type": "string",
                        "description": "The stored file name, as found on the record."
                    },
                    "thumb": {
                        "type": "string",
                        "description": "Thumbnail size specifier, e.g. '100x100'."
                    },
                    "token": {
                        "type": "string",
                        "description": "File access token for protected files."
                    }
                },
                "required": ["collection", "recordId", "filename"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        Ok(pocketbase.get_file_url(
            &input.collection,
            &input.record_id,
            &input.filename,
            input.thumb.as_deref(),
            input.token.as_deref(),
        ))
    }
}

pub struct GenerateFileTokenTool;

#[async_trait::async_trait]
impl Tool for GenerateFileTokenTool {
    type Input = EmptyInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_generate_file_token",
            description: "Generate a short-lived token for accessing protected PocketBase \
                files. Pass the token to pocketbase_get_file_url.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, _input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        pocketbase.generate_file_token().await.map_err(Into::into)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonateUserInput {
    pub collection: String,
    pub record_id: String,
    pub duration: Option<u64>,
}

pub struct ImpersonateUserTool;

#[async_trait::async_trait]
impl Tool for ImpersonateUserTool {
    type Input = ImpersonateUserInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pocketbase_impersonate_user",
            description: "Issue an auth token that impersonates a user of an auth collection. \
                Returns the token and the impersonated record.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The ID or name of the auth collection."
                    },
                    "recordId": {
                        "type": "string",
                        "description": "The ID of the user record to impersonate."
                    },
                    "duration": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Optional token lifetime in seconds; the collection default applies when omitted."
                    }
                },
                "required": ["collection", "recordId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let pocketbase = services.pocketbase().await?;
        let result = pocketbase
            .impersonate_user(&input.collection, &input.record_id, input.duration)
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;

    #[tokio::test]
    async fn test_create_record_requires_data() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &CreateRecordTool,
            &services,
            json!({ "collection": "posts" }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'data'"));
        assert!(result.text.contains("'dataFile'"));
    }

    #[tokio::test]
    async fn test_update_settings_rejects_malformed_json() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &UpdateSettingsTool,
            &services,
            json!({ "settings": "{broken" }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'settings' is not valid JSON"));
    }

    #[test]
    fn test_list_records_defaults() {
        let input: ListRecordsInput =
            serde_json::from_value(json!({ "collection": "posts" })).unwrap();
        assert_eq!(input.page, 1);
        assert_eq!(input.per_page, 30);
    }
}
