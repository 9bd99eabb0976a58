//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use crate::domains::library::{DraftCache, PromptLibrary};

use super::definitions::{
    ImprovePromptTool, PreviewPromptTool, PromptDetailsTool, SaveApprovedPromptTool,
    SavePromptTool, SearchByUseCaseTool, SearchPromptsTool, UpdatePromptTool,
};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching HTTP tool calls (when http feature is enabled)
pub struct ToolRegistry {
    library: Arc<PromptLibrary>,
    drafts: Arc<DraftCache>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(library: Arc<PromptLibrary>, drafts: Arc<DraftCache>) -> Self {
        Self { library, drafts }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            SavePromptTool::NAME,
            PreviewPromptTool::NAME,
            SaveApprovedPromptTool::NAME,
            SearchPromptsTool::NAME,
            SearchByUseCaseTool::NAME,
            UpdatePromptTool::NAME,
            PromptDetailsTool::NAME,
            ImprovePromptTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    /// Both HTTP and STDIO/TCP transports use this to get tool metadata.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            SavePromptTool::to_tool(),
            PreviewPromptTool::to_tool(),
            SaveApprovedPromptTool::to_tool(),
            SearchPromptsTool::to_tool(),
            SearchByUseCaseTool::to_tool(),
            UpdatePromptTool::to_tool(),
            PromptDetailsTool::to_tool(),
            ImprovePromptTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    ///
    /// This is used by the HTTP transport to call tools.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        match name {
            SavePromptTool::NAME => {
                SavePromptTool::http_handler(arguments, self.library.clone()).await
            }
            PreviewPromptTool::NAME => {
                PreviewPromptTool::http_handler(arguments, self.library.clone(), self.drafts.clone())
                    .await
            }
            SaveApprovedPromptTool::NAME => {
                SaveApprovedPromptTool::http_handler(
                    arguments,
                    self.library.clone(),
                    self.drafts.clone(),
                )
                .await
            }
            SearchPromptsTool::NAME => {
                SearchPromptsTool::http_handler(arguments, self.library.clone()).await
            }
            SearchByUseCaseTool::NAME => {
                SearchByUseCaseTool::http_handler(arguments, self.library.clone()).await
            }
            UpdatePromptTool::NAME => {
                UpdatePromptTool::http_handler(arguments, self.library.clone()).await
            }
            PromptDetailsTool::NAME => {
                PromptDetailsTool::http_handler(arguments, self.library.clone()).await
            }
            ImprovePromptTool::NAME => {
                ImprovePromptTool::http_handler(arguments, self.library.clone()).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(format!("Unknown tool: {}", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::library::testing::stub_library;
    use tempfile::TempDir;

    fn test_registry(dir: &TempDir) -> ToolRegistry {
        ToolRegistry::new(
            stub_library(),
            Arc::new(DraftCache::new(dir.path().join("preview.json"))),
        )
    }

    #[test]
    fn test_registry_tool_names() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);
        let names = registry.tool_names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"save_prompt"));
        assert!(names.contains(&"preview_prompt"));
        assert!(names.contains(&"save_approved_prompt"));
        assert!(names.contains(&"search_prompts"));
        assert!(names.contains(&"search_prompts_by_use_case"));
        assert!(names.contains(&"update_prompt"));
        assert!(names.contains(&"get_prompt_details"));
        assert!(names.contains(&"improve_prompt_from_feedback"));
    }

    #[test]
    fn test_get_all_tools_have_descriptions() {
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), 8);
        for tool in tools {
            assert!(tool.description.is_some());
        }
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_known_tool() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);
        let result = registry
            .call_tool(
                "get_prompt_details",
                serde_json::json!({ "prompt_id": "abc" }),
            )
            .await;
        assert!(result.is_ok());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_unknown() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);
        let result = registry.call_tool("unknown", serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
