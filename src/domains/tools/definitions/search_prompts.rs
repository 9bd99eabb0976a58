//! Search prompts tool definition.
//!
//! Semantic search over the stored prompts: the query is embedded and
//! matched against the stored summary embeddings. When the similarity index
//! is unavailable the library degrades to an unranked listing, so this tool
//! still returns results (with a neutral score) rather than failing.

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

use super::common::{
    default_search_limit, error_result, format_timestamp, library_error_message, success_result,
};
use crate::domains::library::PromptLibrary;
use crate::storage::SearchHit;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the search prompts tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchPromptsParams {
    /// Search query to find relevant prompts.
    pub query: String,

    /// Maximum number of results to return (default: 5).
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Search prompts tool - semantic search over stored prompt summaries.
pub struct SearchPromptsTool;

impl SearchPromptsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_prompts";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Retrieves prompts from the database using semantic search over summary embeddings. Returns ranked results with summaries; falls back to an unranked listing when the vector index is unavailable.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(query = %params.query))]
    pub async fn execute(params: &SearchPromptsParams, library: &PromptLibrary) -> CallToolResult {
        info!("Searching prompts");

        match library.search(&params.query, params.limit).await {
            Ok(hits) if hits.is_empty() => success_result(
                "No prompts found matching your query. Try a different search term or save a new prompt."
                    .to_string(),
            ),
            Ok(hits) => success_result(render_hits(&hits)),
            Err(e) => error_result(&library_error_message("search prompts", &e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
    ) -> Result<serde_json::Value, String> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'query' parameter".to_string())?
            .to_string();

        let limit = arguments
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(default_search_limit() as u64) as usize;

        let params = SearchPromptsParams { query, limit };

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
            input_schema: cached_schema_for_type::<SearchPromptsParams>(),
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
                let params: SearchPromptsParams =
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

/// Render the ranked result listing.
fn render_hits(hits: &[SearchHit]) -> String {
    let mut lines = vec![format!("Found {} matching prompt(s):\n", hits.len())];

    for (index, hit) in hits.iter().enumerate() {
        lines.push(format!(
            "{}. **Prompt ID:** {}\n   **Use Case:** {}\n   **Summary:** {}\n   **Similarity Score:** {:.3}\n   **Last Updated:** {}\n",
            index + 1,
            hit.id,
            hit.use_case,
            hit.summary,
            hit.score,
            format_timestamp(&hit.last_updated)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::library::testing::stub_library;
    use crate::storage::UseCase;
    use chrono::TimeZone;
    use chrono::Utc;
    use rmcp::model::RawContent;

    fn hit(id: &str, score: f64) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            use_case: UseCase::CodeGen,
            summary: "Generates parsers".to_string(),
            score,
            last_updated: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_params_default_limit() {
        let params: SearchPromptsParams =
            serde_json::from_str(r#"{"query": "csv parsing"}"#).unwrap();
        assert_eq!(params.limit, 5);
    }

    #[test]
    fn test_params_custom_limit() {
        let params: SearchPromptsParams =
            serde_json::from_str(r#"{"query": "csv parsing", "limit": 2}"#).unwrap();
        assert_eq!(params.limit, 2);
    }

    #[test]
    fn test_render_hits_numbering_and_score_precision() {
        let message = render_hits(&[hit("aaa", 0.91234), hit("bbb", 0.5)]);

        assert!(message.starts_with("Found 2 matching prompt(s):\n"));
        assert!(message.contains("1. **Prompt ID:** aaa"));
        assert!(message.contains("2. **Prompt ID:** bbb"));
        assert!(message.contains("**Similarity Score:** 0.912"));
        assert!(message.contains("**Similarity Score:** 0.500"));
        assert!(message.contains("**Last Updated:** 2024-03-05 09:30:00 UTC"));
        assert!(message.ends_with(
            "Use `get_prompt_details` with a prompt ID to view the full prompt template."
        ));
    }

    #[tokio::test]
    async fn test_execute_reports_empty_result() {
        let library = stub_library();
        let params = SearchPromptsParams {
            query: "anything".to_string(),
            limit: 5,
        };

        let result = SearchPromptsTool::execute(&params, &library).await;
        assert_eq!(result.is_error, Some(false));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert!(text.text.starts_with("No prompts found matching your query"));
        } else {
            panic!("expected text content");
        }
    }
}
