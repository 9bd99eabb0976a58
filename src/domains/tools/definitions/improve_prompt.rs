//! Improve prompt tool definition.
//!
//! Feeds user feedback and the stored template back through the language
//! model, then persists the revised template with a changelog entry. Only
//! the template changes; summary, category, and history stay as they are.

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
use crate::domains::library::PromptLibrary;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the improve prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ImprovePromptParams {
    /// The ID of the prompt to improve.
    pub prompt_id: String,

    /// User feedback about the prompt (what worked, what didn't, suggestions).
    pub feedback: String,

    /// Optional context about how the prompt was used.
    #[serde(default)]
    pub conversation_context: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Improve prompt tool - LLM-driven template revision from feedback.
pub struct ImprovePromptTool;

impl ImprovePromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "improve_prompt_from_feedback";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Uses AI to automatically improve a prompt based on user feedback. Analyzes feedback and suggests improvements to the prompt template.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(prompt_id = %params.prompt_id))]
    pub async fn execute(params: &ImprovePromptParams, library: &PromptLibrary) -> CallToolResult {
        info!("Improve prompt tool called");

        match library
            .improve(
                &params.prompt_id,
                &params.feedback,
                params.conversation_context.as_deref(),
            )
            .await
        {
            Ok(improved) if improved.applied => {
                success_result(render_improved(params, &improved.template))
            }
            Ok(_) => error_result(&format!(
                "Error: Failed to update prompt {}.",
                params.prompt_id
            )),
            Err(e) => error_result(&library_error_message("improve prompt", &e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
    ) -> Result<serde_json::Value, String> {
        let prompt_id = arguments
            .get("prompt_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'prompt_id' parameter".to_string())?
            .to_string();

        let feedback = arguments
            .get("feedback")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'feedback' parameter".to_string())?
            .to_string();

        let conversation_context = arguments
            .get("conversation_context")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let params = ImprovePromptParams {
            prompt_id,
            feedback,
            conversation_context,
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
            input_schema: cached_schema_for_type::<ImprovePromptParams>(),
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
                let params: ImprovePromptParams =
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

/// Render the success message with the new template inline.
fn render_improved(params: &ImprovePromptParams, template: &str) -> String {
    let mut message = format!(
        "Successfully improved prompt {}!\n\n**Feedback:** {}\n",
        params.prompt_id, params.feedback
    );
    if let Some(context) = params
        .conversation_context
        .as_deref()
        .filter(|c| !c.is_empty())
    {
        message.push_str(&format!("**Context:** {}\n", context));
    }
    message.push_str(&format!("\n## Improved Prompt Template\n\n{}", template));
    message.push_str("\n\nThe prompt has been updated with the improvements.");
    message
}

// ============================================================================
// Tests
// ============================================================================
