//! Conversation input validation and template normalization.
//!
//! Tools receive conversation history as a JSON string; it must decode to a
//! non-empty array of `{role, content}` string pairs before anything else
//! happens. Rejecting bad input here guarantees no provider or store call is
//! made for malformed requests.

use serde::{Deserialize, Serialize};

use super::error::LibraryError;

/// A single message from the recorded conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

/// Parse and validate a conversation JSON string.
///
/// The string must decode to a non-empty JSON array of objects, each with
/// string `role` and `content` fields. Anything else is an input error.
pub fn parse_conversation_json(
    conversation_json: &str,
) -> Result<Vec<ConversationMessage>, LibraryError> {
    let value: serde_json::Value = serde_json::from_str(conversation_json)
        .map_err(|e| LibraryError::invalid_input(format!("Invalid JSON format: {}", e)))?;

    if !value.is_array() {
        return Err(LibraryError::invalid_input(
            "Conversation JSON must be a list of messages",
        ));
    }

    let messages: Vec<ConversationMessage> = serde_json::from_value(value).map_err(|_| {
        LibraryError::invalid_input(
            "Each message must have string 'role' and 'content' keys",
        )
    })?;

    if messages.is_empty() {
        return Err(LibraryError::invalid_input(
            "Conversation must contain at least one message",
        ));
    }

    Ok(messages)
}

/// Ensure a prompt template starts with a markdown heading.
///
/// Templates whose trimmed text does not start with `#` get the generic
/// `# Prompt Template` heading prefixed; already-headed templates pass
/// through untouched.
pub fn normalize_template(template: &str) -> String {
    if template.trim().starts_with('#') {
        template.to_string()
    } else {
        format!("# Prompt Template\n\n{}", template)
    }
}
