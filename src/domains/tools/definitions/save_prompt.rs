//! Save prompt tool definition.
//!
//! Analyzes a finished conversation and persists it as a reusable prompt
//! template in a single step. This is the one-shot path; `preview_prompt`
//! plus `save_approved_prompt` is the reviewed two-step alternative.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use super::common::{error_result, library_error_message, success_result};
use crate::domains::library::{PromptLibrary, SavedPrompt};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the save prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SavePromptParams {
    /// JSON string containing the conversation history as a list of messages
    /// with 'role' and 'content' keys.
    pub conversation_messages: String,

    /// Optional description of the task being performed.
    #[serde(default)]
    pub task_description: Option<String>,

    /// Additional context about the conversation.
    #[serde(default)]
    pub context_info: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Save prompt tool - analyzes a conversation and stores it as a template.
pub struct SavePromptTool;

impl SavePromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "save_prompt";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Summarizes, categorizes, and converts conversation history into a markdown formatted prompt template. Run upon completion of a successful complex task to build your prompt library.";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub async fn execute(params: &SavePromptParams, library: &PromptLibrary) -> CallToolResult {
        info!("Save prompt tool called");

        match library
            .save_conversation(
                &params.conversation_messages,
                params.task_description.as_deref(),
            )
            .await
        {
            Ok(saved) => success_result(render_saved(&saved, params.context_info.as_deref())),
            Err(e) => error_result(&library_error_message("save prompt", &e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
    ) -> Result<serde_json::Value, String> {
        let conversation_messages = arguments
            .get("conversation_messages")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'conversation_messages' parameter".to_string())?
            .to_string();

        let task_description = arguments
            .get("task_description")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let context_info = arguments
            .get("context_info")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let params = SavePromptParams {
            conversation_messages,
            task_description,
            context_info,
        };

        let result = Self::execute(&params, &library).await;

        Ok(serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SavePromptParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(library: Arc<PromptLibrary>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let library = library.clone();
            async move {
                let params: SavePromptParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &library).await)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Render the success message for a saved prompt.
fn render_saved(saved: &SavedPrompt, context_info: Option<&str>) -> String {
    let mut message = format!(
        "Successfully saved prompt!\n\n**Prompt ID:** {}\n**Use Case:** {}\n**Summary:** {}\n\nThe prompt has been saved and can be retrieved using the prompt ID or searched using semantic search.",
        saved.id, saved.use_case, saved.summary
    );
    if let Some(context) = context_info.filter(|c| !c.is_empty()) {
        message.push_str(&format!("\n\n**Context:** {}", context));
    }
    message
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::library::testing::stub_library;
    use crate::storage::UseCase;
    use rmcp::model::RawContent;

    fn saved() -> SavedPrompt {
        SavedPrompt {
            id: "64b0c5f2aa11223344556677".to_string(),
            use_case: UseCase::CodeGen,
            summary: "Generates parsers".to_string(),
        }
    }

    #[test]
    fn test_params_require_conversation() {
        assert!(serde_json::from_str::<SavePromptParams>("{}").is_err());
    }

    #[test]
    fn test_params_optional_fields_default_to_none() {
        let params: SavePromptParams =
            serde_json::from_str(r#"{"conversation_messages": "[]"}"#).unwrap();
        assert!(params.task_description.is_none());
        assert!(params.context_info.is_none());
    }

    #[test]
    fn test_render_saved_without_context() {
        let message = render_saved(&saved(), None);
        assert!(message.starts_with("Successfully saved prompt!"));
        assert!(message.contains("**Prompt ID:** 64b0c5f2aa11223344556677"));
        assert!(message.contains("**Use Case:** code-gen"));
        assert!(message.contains("**Summary:** Generates parsers"));
        assert!(!message.contains("**Context:**"));
    }

    #[test]
    fn test_render_saved_with_context() {
        let message = render_saved(&saved(), Some("from the CI pipeline"));
        assert!(message.ends_with("**Context:** from the CI pipeline"));
    }

    #[test]
    fn test_render_saved_skips_empty_context() {
        let message = render_saved(&saved(), Some(""));
        assert!(!message.contains("**Context:**"));
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_conversation() {
        let library = stub_library();
        let params = SavePromptParams {
            conversation_messages: "not json".to_string(),
            task_description: None,
            context_info: None,
        };

        let result = SavePromptTool::execute(&params, &library).await;
        assert_eq!(result.is_error, Some(true));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert!(text.text.starts_with("Error: Invalid input:"));
        } else {
            panic!("expected text content");
        }
    }

    #[tokio::test]
    async fn test_execute_saves_valid_conversation() {
        let library = stub_library();
        let params = SavePromptParams {
            conversation_messages: r#"[{"role":"user","content":"hi"}]"#.to_string(),
            task_description: None,
            context_info: None,
        };

        let result = SavePromptTool::execute(&params, &library).await;
        assert_eq!(result.is_error, Some(false));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert!(text.text.starts_with("Successfully saved prompt!"));
        } else {
            panic!("expected text content");
        }
    }
}
