//! Search prompts by use case tool definition.
//!
//! Category listing: returns the prompts in one use case, most recently
//! updated first. No embeddings are involved on this path.

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

use super::common::{
    default_use_case_limit, error_result, format_timestamp, library_error_message, success_result,
};
use crate::domains::library::PromptLibrary;
use crate::storage::{PromptRecord, UseCase};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the search by use case tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchByUseCaseParams {
    /// Use case category to filter by (one of: code-gen, text-gen,
    /// data-analysis, creative, general).
    pub use_case: String,

    /// Maximum number of results to return (default: 10).
    #[serde(default = "default_use_case_limit")]
    pub limit: usize,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Search by use case tool - lists prompts in a category.
pub struct SearchByUseCaseTool;

impl SearchByUseCaseTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_prompts_by_use_case";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Retrieves prompts filtered by use case category. Use cases: code-gen, text-gen, data-analysis, creative, general.";

    /// Execute the tool logic.
    pub async fn execute(
        params: &SearchByUseCaseParams,
        library: &PromptLibrary,
    ) -> CallToolResult {
        let Some(use_case) = UseCase::parse(&params.use_case) else {
            return error_result(&format!(
                "Invalid use case. Must be one of: {}",
                UseCase::valid_values()
            ));
        };

        info!("Listing prompts for use case: {}", use_case);

        match library.search_by_use_case(use_case, params.limit).await {
            Ok(records) if records.is_empty() => success_result(format!(
                "No prompts found for use case '{}'. Try saving a prompt with this use case first.",
                use_case
            )),
            Ok(records) => success_result(render_records(use_case, &records)),
            Err(e) => error_result(&library_error_message("search prompts by use case", &e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
    ) -> Result<serde_json::Value, String> {
        let use_case = arguments
            .get("use_case")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'use_case' parameter".to_string())?
            .to_string();

        let limit = arguments
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(default_use_case_limit() as u64) as usize;

        let params = SearchByUseCaseParams { use_case, limit };

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
            input_schema: cached_schema_for_type::<SearchByUseCaseParams>(),
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
                let params: SearchByUseCaseParams =
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

/// Render the category listing.
fn render_records(use_case: UseCase, records: &[PromptRecord]) -> String {
    let mut lines = vec![format!(
        "Found {} prompt(s) for use case '{}':\n",
        records.len(),
        use_case
    )];

    for (index, record) in records.iter().enumerate() {
        lines.push(format!(
            "{}. **Prompt ID:** {}\n   **Summary:** {}\n   **Last Updated:** {}\n",
            index + 1,
            record.id,
            record.summary,
            format_timestamp(&record.last_updated)
        ));
    }

    lines.push(
        "\nUse `get_prompt_details` with a prompt ID to view the full prompt template."
            .to_string(),
    );
    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
