//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod common;
pub mod improve_prompt;
pub mod preview_prompt;
pub mod prompt_details;
pub mod save_approved_prompt;
pub mod save_prompt;
pub mod search_by_use_case;
pub mod search_prompts;
pub mod update_prompt;

pub use improve_prompt::ImprovePromptTool;
pub use preview_prompt::PreviewPromptTool;
pub use prompt_details::PromptDetailsTool;
pub use save_approved_prompt::SaveApprovedPromptTool;
pub use save_prompt::SavePromptTool;
pub use search_by_use_case::SearchByUseCaseTool;
pub use search_prompts::SearchPromptsTool;
pub use update_prompt::UpdatePromptTool;
