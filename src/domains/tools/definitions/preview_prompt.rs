//! Preview prompt tool definition.
//!
//! Runs the conversation analysis without saving anything to the database.
//! The resulting draft is shown for review and cached on disk so that
//! `save_approved_prompt` can persist it once the user signs off.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::common::{error_result, library_error_message, success_result};
use crate::domains::library::{DraftCache, PendingDraft, PromptLibrary};

/// Width of the horizontal rule around the previewed template.
const DIVIDER_WIDTH: usize = 60;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the preview prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PreviewPromptParams {
    /// JSON string containing the conversation history as a list of messages
    /// with 'role' and 'content' keys.
    pub conversation_messages: String,

    /// Optional description of the task being performed.
    #[serde(default)]
    pub task_description: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Preview prompt tool - analyzes a conversation without saving it.
pub struct PreviewPromptTool;

impl PreviewPromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "preview_prompt";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Generate a preview of what the prompt template will look like before saving. Shows category, summary, history, and full template for review.";

    /// Execute the tool logic.
    pub async fn execute(
        params: &PreviewPromptParams,
        library: &PromptLibrary,
        drafts: &DraftCache,
    ) -> CallToolResult {
        info!("Preview prompt tool called");

        let draft = match library
            .preview(
                &params.conversation_messages,
                params.task_description.as_deref(),
            )
            .await
        {
            Ok(draft) => draft,
            Err(e) => return error_result(&library_error_message("generate preview", &e)),
        };

        let pending = PendingDraft {
            use_case: draft.use_case,
            summary: draft.summary,
            prompt_template: draft.prompt_template,
            history: draft.history,
            conversation_json: params.conversation_messages.clone(),
            task_description: params.task_description.clone(),
        };

        if let Err(e) = drafts.store(&pending) {
            return error_result(&library_error_message("generate preview", &e));
        }

        let echo = match serde_json::to_string_pretty(&pending) {
            Ok(echo) => echo,
            Err(e) => return error_result(&format!("Error: Failed to generate preview: {}", e)),
        };

        success_result(render_preview(&pending, &echo))
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
        drafts: Arc<DraftCache>,
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

        let params = PreviewPromptParams {
            conversation_messages,
            task_description,
        };

        let result = Self::execute(&params, &library, &drafts).await;

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
            input_schema: cached_schema_for_type::<PreviewPromptParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(library: Arc<PromptLibrary>, drafts: Arc<DraftCache>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let library = library.clone();
            let drafts = drafts.clone();
            async move {
                let params: PreviewPromptParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &library, &drafts).await)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Render the review message for a draft. `echo` is the draft serialized as
/// JSON so the client can hand the exact fields back to
/// `save_approved_prompt`.
fn render_preview(draft: &PendingDraft, echo: &str) -> String {
    let divider = "-".repeat(DIVIDER_WIDTH);
    format!(
        r#"📋 PROMPT PREVIEW

📁 **Category:** {use_case}

📝 **Summary:**
{summary}

📜 **What We Did:**
{history}

📄 **Prompt Template:**
{divider}
{template}
{divider}

---

💡 **To save this prompt:** Use the `save_approved_prompt` tool with this preview data.

**Preview Data (for saving):**
```json
{echo}
```

**Note:** You can ask me to regenerate with specific feedback before saving, or proceed to save this version.
"#,
        use_case = draft.use_case,
        summary = draft.summary,
        history = draft.history,
        divider = divider,
        template = draft.prompt_template,
        echo = echo,
    )
}

// ============================================================================
// Tests
// ============================================================================
