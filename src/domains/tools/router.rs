//! Tool Router - builds the rmcp ToolRouter from the tool definitions.
//!
//! This module builds the ToolRouter for STDIO/TCP transport by delegating
//! to the tool definitions themselves. Each tool knows how to create its own
//! route; the library and draft cache are cloned into each one.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::domains::library::{DraftCache, PromptLibrary};

use super::definitions::{
    ImprovePromptTool, PreviewPromptTool, PromptDetailsTool, SaveApprovedPromptTool,
    SavePromptTool, SearchByUseCaseTool, SearchPromptsTool, UpdatePromptTool,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(library: Arc<PromptLibrary>, drafts: Arc<DraftCache>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(SavePromptTool::create_route(library.clone()))
        .with_route(PreviewPromptTool::create_route(
            library.clone(),
            drafts.clone(),
        ))
        .with_route(SaveApprovedPromptTool::create_route(library.clone(), drafts))
        .with_route(SearchPromptsTool::create_route(library.clone()))
        .with_route(SearchByUseCaseTool::create_route(library.clone()))
        .with_route(UpdatePromptTool::create_route(library.clone()))
        .with_route(PromptDetailsTool::create_route(library.clone()))
        .with_route(ImprovePromptTool::create_route(library))
}
