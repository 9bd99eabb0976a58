//! Prompt details tool definition.
//!
//! Fetches one prompt and renders everything about it: metadata, changelog,
//! history, and the full template.

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

use super::common::{error_result, format_timestamp, library_error_message, success_result};
use crate::domains::library::PromptLibrary;
use crate::storage::PromptRecord;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the prompt details tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PromptDetailsParams {
    /// The ID of the prompt to retrieve.
    pub prompt_id: String,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Prompt details tool - full record dump for one prompt.
pub struct PromptDetailsTool;

impl PromptDetailsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_prompt_details";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Retrieves the complete details of a specific prompt including the full template, history, and metadata.";

    /// Execute the tool logic.
    pub async fn execute(params: &PromptDetailsParams, library: &PromptLibrary) -> CallToolResult {
        info!("Fetching details for prompt {}", params.prompt_id);

        match library.fetch_details(&params.prompt_id).await {
            Ok(record) => success_result(render_details(&record)),
            Err(e) => error_result(&library_error_message("get prompt details", &e)),
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

        let params = PromptDetailsParams { prompt_id };

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
            input_schema: cached_schema_for_type::<PromptDetailsParams>(),
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
                let params: PromptDetailsParams =
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

/// Render the full record as a markdown document.
fn render_details(record: &PromptRecord) -> String {
    let mut lines = vec![
        "# Prompt Details\n".to_string(),
        format!("**Prompt ID:** {}", record.id),
        format!("**Use Case:** {}", record.use_case),
        format!("**Summary:** {}", record.summary),
        format!("**Last Updated:** {}", format_timestamp(&record.last_updated)),
        format!("**Number of Updates:** {}", record.num_updates),
    ];

    if let Some(ref created_by) = record.created_by {
        lines.push(format!("**Created By:** {}", created_by));
    }

    if !record.changelog.is_empty() {
        lines.push("\n## Changelog".to_string());
        for (index, entry) in record.changelog.iter().enumerate() {
            lines.push(format!("{}. {}", index + 1, entry));
        }
    }

    lines.push(format!("\n## History\n{}", record.history));
    lines.push(format!("\n## Prompt Template\n\n{}", record.prompt_template));

    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
