//! Update prompt tool definition.
//!
//! Partial updates over a stored prompt. Every update appends to the
//! changelog, and a changed summary regenerates the embedding so semantic
//! search keeps matching what the record now says.

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
use crate::domains::library::{PromptLibrary, UpdateRequest};
use crate::storage::UseCase;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the update prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdatePromptParams {
    /// The ID of the prompt to update.
    pub prompt_id: String,

    /// Description of what changed (will be added to changelog).
    pub change_description: String,

    /// Optional new prompt template. If not provided, existing template is kept.
    #[serde(default)]
    pub prompt_template: Option<String>,

    /// Optional new summary. If provided and different, embedding will be
    /// regenerated.
    #[serde(default)]
    pub summary: Option<String>,

    /// Optional new use case category.
    #[serde(default)]
    pub use_case: Option<String>,

    /// Optional updated history.
    #[serde(default)]
    pub history: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Update prompt tool - applies a partial update with changelog tracking.
pub struct UpdatePromptTool;

impl UpdatePromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "update_prompt";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Updates an existing prompt with new information. Regenerates embedding if summary changes. Tracks changes in changelog.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(prompt_id = %params.prompt_id))]
    pub async fn execute(params: &UpdatePromptParams, library: &PromptLibrary) -> CallToolResult {
        let use_case = match params.use_case.as_deref() {
            Some(value) => match UseCase::parse(value) {
                Some(uc) => Some(uc),
                None => {
                    return error_result(&format!(
                        "Invalid use case. Must be one of: {}",
                        UseCase::valid_values()
                    ));
                }
            },
            None => None,
        };

        info!("Update prompt tool called");

        let request = UpdateRequest {
            change_description: params.change_description.clone(),
            prompt_template: params.prompt_template.clone(),
            summary: params.summary.clone(),
            use_case,
            history: params.history.clone(),
        };

        match library.update(&params.prompt_id, request).await {
            Ok(outcome) if outcome.applied => {
                success_result(render_updated(params, outcome.embedding_refreshed))
            }
            Ok(_) => error_result(&format!(
                "Error: Failed to update prompt {}.",
                params.prompt_id
            )),
            Err(e) => error_result(&library_error_message("update prompt", &e)),
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

        let change_description = arguments
            .get("change_description")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing or invalid 'change_description' parameter".to_string())?
            .to_string();

        let optional = |key: &str| {
            arguments
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let params = UpdatePromptParams {
            prompt_id,
            change_description,
            prompt_template: optional("prompt_template"),
            summary: optional("summary"),
            use_case: optional("use_case"),
            history: optional("history"),
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
            input_schema: cached_schema_for_type::<UpdatePromptParams>(),
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
                let params: UpdatePromptParams =
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

/// Render the success message, listing what the update touched.
fn render_updated(params: &UpdatePromptParams, embedding_refreshed: bool) -> String {
    let mut message = format!(
        "Successfully updated prompt {}!\n\n**Change Description:** {}\n",
        params.prompt_id, params.change_description
    );
    if let Some(ref summary) = params.summary {
        message.push_str(&format!("**New Summary:** {}\n", summary));
    }
    if params.prompt_template.is_some() {
        message.push_str("**Template Updated:** Yes\n");
    }
    if embedding_refreshed {
        message.push_str("**Embedding Regenerated:** Yes\n");
    }
    message.push_str("\nThe prompt has been updated and the change has been logged.");
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

    fn params() -> UpdatePromptParams {
        UpdatePromptParams {
            prompt_id: "64b0c5f2aa11223344556677".to_string(),
            change_description: "Clarified the output format".to_string(),
            prompt_template: None,
            summary: None,
            use_case: None,
            history: None,
        }
    }

    #[test]
    fn test_params_optional_fields_default_to_none() {
        let params: UpdatePromptParams = serde_json::from_str(
            r#"{"prompt_id": "abc", "change_description": "tweak"}"#,
        )
        .unwrap();
        assert!(params.prompt_template.is_none());
        assert!(params.summary.is_none());
        assert!(params.use_case.is_none());
        assert!(params.history.is_none());
    }

    #[test]
    fn test_render_updated_minimal() {
        let message = render_updated(&params(), false);
        assert!(message.starts_with("Successfully updated prompt 64b0c5f2aa11223344556677!"));
        assert!(message.contains("**Change Description:** Clarified the output format"));
        assert!(!message.contains("**New Summary:**"));
        assert!(!message.contains("**Template Updated:**"));
        assert!(!message.contains("**Embedding Regenerated:**"));
        assert!(message.ends_with("The prompt has been updated and the change has been logged."));
    }

    #[test]
    fn test_render_updated_full() {
        let mut full = params();
        full.summary = Some("New summary".to_string());
        full.prompt_template = Some("# T".to_string());

        let message = render_updated(&full, true);
        assert!(message.contains("**New Summary:** New summary"));
        assert!(message.contains("**Template Updated:** Yes"));
        assert!(message.contains("**Embedding Regenerated:** Yes"));
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_use_case() {
        let library = stub_library();
        let mut bad = params();
        bad.use_case = Some("everything".to_string());

        let result = UpdatePromptTool::execute(&bad, &library).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_execute_reports_missing_prompt() {
        // The stub store has no records, so every fetch misses.
        let library = stub_library();

        let result = UpdatePromptTool::execute(&params(), &library).await;
        assert_eq!(result.is_error, Some(true));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert_eq!(
                text.text,
                "Error: Prompt with ID 64b0c5f2aa11223344556677 not found."
            );
        } else {
            panic!("expected text content");
        }
    }
}
