//! Common utilities shared across prompt tools.
//!
//! This module provides response construction helpers, the canonical mapping
//! from library errors to tool-facing messages, and shared formatting.

use chrono::{DateTime, Utc};
use rmcp::model::{CallToolResult, Content};
use tracing::warn;

use crate::domains::library::{DEFAULT_SEARCH_LIMIT, DEFAULT_USE_CASE_LIMIT, LibraryError};

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result with text content.
pub fn success_result(content: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(content)])
}

/// Map a library error to the canonical tool-facing message.
///
/// Validation failures and missing prompts have fixed formats of their own;
/// `action` names the failed operation ("save prompt", "update prompt", ...)
/// and only appears for provider and store failures.
pub fn library_error_message(action: &str, err: &LibraryError) -> String {
    match err {
        LibraryError::InvalidInput(msg) => format!("Error: Invalid input: {}", msg),
        LibraryError::NotFound(id) => format!("Error: Prompt with ID {} not found.", id),
        other => format!("Error: Failed to {}: {}", action, other),
    }
}

/// Format a timestamp for display in tool output.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Default result count for `search_prompts`.
pub fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Default result count for `search_prompts_by_use_case`.
pub fn default_use_case_limit() -> usize {
    DEFAULT_USE_CASE_LIMIT
}
