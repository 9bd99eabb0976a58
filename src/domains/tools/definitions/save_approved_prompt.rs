//! Save approved prompt tool definition.
//!
//! Persists a draft that was already reviewed via `preview_prompt`. The
//! fields are stored exactly as supplied; no re-analysis happens here, so
//! what the user approved is what lands in the database.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use super::common::{error_result, library_error_message, success_result};
use crate::domains::library::{DraftCache, PromptDraft, PromptLibrary, SavedPrompt};
use crate::storage::UseCase;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the save approved prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveApprovedPromptParams {
    /// Use case category from the preview data (one of: code-gen, text-gen,
    /// data-analysis, creative, general).
    pub use_case: String,

    /// Summary from the preview data.
    pub summary: String,

    /// Markdown prompt template from the preview data.
    pub prompt_template: String,

    /// History from the preview data.
    pub history: String,

    /// Additional context about the conversation.
    #[serde(default)]
    pub context_info: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Save approved prompt tool - persists previewed data without re-analysis.
pub struct SaveApprovedPromptTool;

impl SaveApprovedPromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "save_approved_prompt";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Saves a previously previewed prompt to the database. Takes the approved preview data (use case, summary, template, history) and persists it exactly as reviewed, without re-analysis.";

    /// Execute the tool logic.
    pub async fn execute(
        params: &SaveApprovedPromptParams,
        library: &PromptLibrary,
        drafts: &DraftCache,
    ) -> CallToolResult {
        info!("Save approved prompt tool called");

        let Some(use_case) = UseCase::parse(&params.use_case) else {
            return error_result(&format!(
                "Invalid use case. Must be one of: {}",
                UseCase::valid_values()
            ));
        };

        let draft = PromptDraft {
            use_case,
            summary: params.summary.clone(),
            prompt_template: params.prompt_template.clone(),
            history: params.history.clone(),
        };

        match library.commit_draft(draft).await {
            Ok(saved) => {
                // The cached preview is stale once its data is stored.
                if let Err(e) = drafts.clear() {
                    warn!("Could not clear cached preview: {}", e);
                }
                success_result(render_saved(&saved, params.context_info.as_deref()))
            }
            Err(e) => error_result(&library_error_message("save approved prompt", &e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        library: Arc<PromptLibrary>,
        drafts: Arc<DraftCache>,
    ) -> Result<serde_json::Value, String> {
        let use_case = arguments
            .get("use_case")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'use_case' parameter".to_string())?
            .to_string();

        let summary = arguments
            .get("summary")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'summary' parameter".to_string())?
            .to_string();

        let prompt_template = arguments
            .get("prompt_template")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'prompt_template' parameter".to_string())?
            .to_string();

        let history = arguments
            .get("history")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'history' parameter".to_string())?
            .to_string();

        let context_info = arguments
            .get("context_info")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let params = SaveApprovedPromptParams {
            use_case,
            summary,
            prompt_template,
            history,
            context_info,
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
            input_schema: cached_schema_for_type::<SaveApprovedPromptParams>(),
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
                let params: SaveApprovedPromptParams =
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

/// Render the success message for an approved prompt save.
fn render_saved(saved: &SavedPrompt, context_info: Option<&str>) -> String {
    let mut message = format!(
        "Successfully saved approved prompt!\n\n**Prompt ID:** {}\n**Use Case:** {}\n**Summary:** {}\n\nThe prompt has been saved and can be retrieved using the prompt ID or searched using semantic search.",
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
    use rmcp::model::RawContent;
    use tempfile::TempDir;

    fn params() -> SaveApprovedPromptParams {
        SaveApprovedPromptParams {
            use_case: "creative".to_string(),
            summary: "Writes limericks".to_string(),
            prompt_template: "# Prompt Template\n\nWrite a limerick.".to_string(),
            history: "Approved after review".to_string(),
            context_info: None,
        }
    }

    #[test]
    fn test_params_require_all_draft_fields() {
        let err = serde_json::from_str::<SaveApprovedPromptParams>(
            r#"{"use_case": "creative", "summary": "x"}"#,
        );
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_use_case() {
        let dir = TempDir::new().unwrap();
        let drafts = DraftCache::new(dir.path().join("preview.json"));
        let library = stub_library();
        let mut bad = params();
        bad.use_case = "misc".to_string();

        let result = SaveApprovedPromptTool::execute(&bad, &library, &drafts).await;
        assert_eq!(result.is_error, Some(true));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert_eq!(
                text.text,
                "Invalid use case. Must be one of: code-gen, text-gen, data-analysis, creative, general"
            );
        } else {
            panic!("expected text content");
        }
    }

    #[tokio::test]
    async fn test_execute_saves_and_clears_cached_preview() {
        let dir = TempDir::new().unwrap();
        let drafts = DraftCache::new(dir.path().join("preview.json"));
        std::fs::write(drafts.path(), "{}").unwrap();
        let library = stub_library();

        let result = SaveApprovedPromptTool::execute(&params(), &library, &drafts).await;
        assert_eq!(result.is_error, Some(false));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert!(text.text.starts_with("Successfully saved approved prompt!"));
            assert!(text.text.contains("**Use Case:** creative"));
        } else {
            panic!("expected text content");
        }
        assert!(!drafts.path().exists());
    }
}
