//! Quip document and comment tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, OutputMode, Tool, ToolSpec};
use crate::utils::resolve_content;

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![
        Box::new(GetDocumentTool),
        Box::new(GetFolderTool),
        Box::new(SearchDocumentsTool),
        Box::new(ListRecentTool),
        Box::new(ListCommentsTool),
        Box::new(CreateDocumentTool),
        Box::new(EditDocumentTool),
        Box::new(AppendDocumentTool),
        Box::new(AddCommentTool),
    ]
}

fn spooled(tool_ref: &'static str) -> OutputMode {
    OutputMode::Spooled {
        module_ref: "quip",
        tool_ref,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadIdInput {
    pub thread_id: String,
}

pub struct GetDocumentTool;

#[async_trait::async_trait]
impl Tool for GetDocumentTool {
    type Input = ThreadIdInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_get_document",
            description: "Get a Quip document (thread) by ID, including its metadata and full \
                HTML content. Results are written to a temporary file as JSON and the file path \
                is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "threadId": {
                        "type": "string",
                        "description": "The ID of the Quip document (thread). Example: 'AbCdEfGhIjK'"
                    }
                },
                "required": ["threadId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-document")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let quip = services.quip().await?;
        Ok(serde_json::to_string_pretty(&quip.get_thread(&input.thread_id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFolderInput {
    pub folder_id: String,
}

pub struct GetFolderTool;

#[async_trait::async_trait]
impl Tool for GetFolderTool {
    type Input = GetFolderInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_get_folder",
            description: "Get a Quip folder by ID, including its children (documents and \
                subfolders). Results are written to a temporary file as JSON and the file path \
                is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "folderId": {
                        "type": "string",
                        "description": "The ID of the Quip folder."
                    }
                },
                "required": ["folderId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("get-folder")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let quip = services.quip().await?;
        Ok(serde_json::to_string_pretty(&quip.get_folder(&input.folder_id).await?)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocumentsInput {
    pub query: String,
    #[serde(default = "default_search_count")]
    pub count: u64,
    #[serde(default)]
    pub only_match_titles: bool,
}

fn default_search_count() -> u64 {
    10
}

pub struct SearchDocumentsTool;

#[async_trait::async_trait]
impl Tool for SearchDocumentsTool {
    type Input = SearchDocumentsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_search_documents",
            description: "Search Quip documents by text query. Results are written to a \
                temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query text."
                    },
                    "count": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 10,
                        "description": "Maximum number of threads to return."
                    },
                    "onlyMatchTitles": {
                        "type": "boolean",
                        "default": false,
                        "description": "When true, only match against document titles."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("search-documents")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let quip = services.quip().await?;
        let result = quip
            .search_threads(&input.query, input.count, input.only_match_titles)
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecentInput {
    #[serde(default = "default_search_count")]
    pub count: u64,
    pub max_updated_usec: Option<u64>,
}

pub struct ListRecentTool;

#[async_trait::async_trait]
impl Tool for ListRecentTool {
    type Input = ListRecentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_list_recent",
            description: "List the most recently updated Quip documents visible to the API \
                token. Results are written to a temporary file as JSON and the file path is \
                returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "count": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 10,
                        "description": "Maximum number of threads to return."
                    },
                    "maxUpdatedUsec": {
                        "type": "integer",
                        "description": "Only return threads updated before this microsecond timestamp (for paging backwards)."
                    }
                }
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-recent")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let quip = services.quip().await?;
        let result = quip
            .get_recent_threads(input.count, input.max_updated_usec)
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsInput {
    pub thread_id: String,
    #[serde(default = "default_comment_count")]
    pub count: u64,
    pub max_created_usec: Option<u64>,
}

fn default_comment_count() -> u64 {
    25
}

pub struct ListCommentsTool;

#[async_trait::async_trait]
impl Tool for ListCommentsTool {
    type Input = ListCommentsInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_list_comments",
            description: "List comments (messages) on a Quip document. Results are written to a \
                temporary file as JSON and the file path is returned.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "threadId": {
                        "type": "string",
                        "description": "The ID of the Quip document (thread)."
                    },
                    "count": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 100,
                        "default": 25,
                        "description": "Maximum number of messages to return."
                    },
                    "maxCreatedUsec": {
                        "type": "integer",
                        "description": "Only return messages created before this microsecond timestamp (for paging backwards)."
                    }
                },
                "required": ["threadId"]
            }),
        }
    }

    fn output_mode(&self) -> OutputMode {
        spooled("list-comments")
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let quip = services.quip().await?;
        let result = quip
            .get_messages(&input.thread_id, input.count, input.max_created_usec)
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentInput {
    pub title: String,
    pub content: Option<String>,
    pub content_file: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

pub struct CreateDocumentTool;

#[async_trait::async_trait]
impl Tool for CreateDocumentTool {
    type Input = CreateDocumentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_create_document",
            description: "Create a new Quip document from Markdown content, optionally shared \
                with the given member or folder IDs.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the new document."
                    },
                    "content": {
                        "type": "string",
                        "description": "The document content in Markdown format."
                    },
                    "contentFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the content. Use this for large documents instead of 'content'."
                    },
                    "memberIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "User or folder IDs to share the document with."
                    }
                },
                "required": ["title"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let content = resolve_content(
            input.content.as_deref(),
            input.content_file.as_deref(),
            "content",
        )?;

        let quip = services.quip().await?;
        let thread = quip
            .create_document(&input.title, &content, &input.member_ids, "markdown")
            .await?;

        Ok(format!(
            "Document created successfully. ID: {}, Link: {}",
            thread["thread"]["id"].as_str().unwrap_or_default(),
            thread["thread"]["link"].as_str().unwrap_or_default()
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDocumentInput {
    pub thread_id: String,
    pub section_id: Option<String>,
    #[serde(default = "default_edit_operation")]
    pub operation: String,
    pub content: Option<String>,
    pub content_file: Option<String>,
}

fn default_edit_operation() -> String {
    "append".to_string()
}

pub struct EditDocumentTool;

#[async_trait::async_trait]
impl Tool for EditDocumentTool {
    type Input = EditDocumentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_edit_document",
            description: "Edit a Quip document: replace, delete, or insert content relative to \
                a section, or append/prepend at document level. Section operations require \
                'sectionId' (section IDs are in the document HTML from quip_get_document).",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "threadId": {
                        "type": "string",
                        "description": "The ID of the Quip document (thread) to edit."
                    },
                    "sectionId": {
                        "type": "string",
                        "description": "The section to operate on. Required for 'replace', 'delete', 'after_section', and 'before_section'."
                    },
                    "operation": {
                        "type": "string",
                        "enum": ["prepend", "append", "replace", "delete", "after_section", "before_section"],
                        "default": "append",
                        "description": "What to do with the content relative to the section or document."
                    },
                    "content": {
                        "type": "string",
                        "description": "The content in Markdown format. Not needed for 'delete'."
                    },
                    "contentFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the content. Use this for large edits instead of 'content'."
                    }
                },
                "required": ["threadId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let content = if input.operation == "delete" {
            String::new()
        } else {
            resolve_content(
                input.content.as_deref(),
                input.content_file.as_deref(),
                "content",
            )?
        };

        let quip = services.quip().await?;
        quip.edit_document(
            &input.thread_id,
            &content,
            input.section_id.as_deref(),
            &input.operation,
            "markdown",
        )
        .await?;

        Ok(format!(
            "Document {} edited successfully ({}).",
            input.thread_id, input.operation
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendDocumentInput {
    pub thread_id: String,
    pub content: Option<String>,
    pub content_file: Option<String>,
    #[serde(default = "default_append_location")]
    pub location: String,
}

fn default_append_location() -> String {
    "end".to_string()
}

pub struct AppendDocumentTool;

#[async_trait::async_trait]
impl Tool for AppendDocumentTool {
    type Input = AppendDocumentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_append_document",
            description: "Append or prepend content to an existing Quip document. For \
                section-specific edits, use quip_edit_document instead.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "threadId": {
                        "type": "string",
                        "description": "The ID of the Quip document (thread) to append to."
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to add, in Markdown format."
                    },
                    "contentFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the content. Use this for large content instead of 'content'."
                    },
                    "location": {
                        "type": "string",
                        "enum": ["beginning", "end"],
                        "default": "end",
                        "description": "Where to insert the content: 'end' (default) appends, 'beginning' prepends."
                    }
                },
                "required": ["threadId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let content = resolve_content(
            input.content.as_deref(),
            input.content_file.as_deref(),
            "content",
        )?;
        let operation = if input.location == "beginning" {
            "prepend"
        } else {
            "append"
        };

        let quip = services.quip().await?;
        quip.edit_document(&input.thread_id, &content, None, operation, "markdown")
            .await?;

        Ok(format!(
            "Successfully {}ed content to document {}",
            operation, input.thread_id
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentInput {
    pub thread_id: String,
    pub content: Option<String>,
    pub content_file: Option<String>,
    pub section_id: Option<String>,
    pub annotation_id: Option<String>,
}

pub struct AddCommentTool;

#[async_trait::async_trait]
impl Tool for AddCommentTool {
    type Input = AddCommentInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "quip_add_comment",
            description: "Add a comment to a Quip document, optionally anchored to a section or \
                an existing annotation.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "threadId": {
                        "type": "string",
                        "description": "The ID of the Quip document (thread) to comment on."
                    },
                    "content": {
                        "type": "string",
                        "description": "The comment text."
                    },
                    "contentFile": {
                        "type": "string",
                        "description": "Absolute path to a file containing the comment text. Use this for long comments instead of 'content'."
                    },
                    "sectionId": {
                        "type": "string",
                        "description": "Anchor the comment to this section of the document."
                    },
                    "annotationId": {
                        "type": "string",
                        "description": "Reply to this existing annotation thread."
                    }
                },
                "required": ["threadId"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let content = resolve_content(
            input.content.as_deref(),
            input.content_file.as_deref(),
            "content",
        )?;

        let quip = services.quip().await?;
        let message = quip
            .new_message(
                &input.thread_id,
                &content,
                input.section_id.as_deref(),
                input.annotation_id.as_deref(),
            )
            .await?;

        Ok(format!(
            "Comment added successfully. ID: {}",
            message["id"].as_str().unwrap_or_default()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::invoke;

    #[tokio::test]
    async fn test_append_requires_content() {
        let services = ServiceRegistry::new();
        let result = invoke(
            &AppendDocumentTool,
            &services,
            json!({ "threadId": "T1" }),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.contains("'content'"));
        assert!(result.text.contains("'contentFile'"));
    }

    #[test]
    fn test_edit_defaults_to_append() {
        let input: EditDocumentInput =
            serde_json::from_value(json!({ "threadId": "T1" })).unwrap();
        assert_eq!(input.operation, "append");
    }

    #[test]
    fn test_search_defaults() {
        let input: SearchDocumentsInput =
            serde_json::from_value(json!({ "query": "roadmap" })).unwrap();
        assert_eq!(input.count, 10);
        assert!(!input.only_match_titles);
    }
}
