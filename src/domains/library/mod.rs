//! Library domain module.
//!
//! This module owns the prompt lifecycle: turning conversations into stored
//! prompt templates, searching them, and evolving them over time. The tools
//! domain is a thin presentation layer over the operations defined here.
//!
//! ## Architecture
//!
//! - `conversation.rs` - Conversation JSON parsing and template normalization
//! - `draft.rs` - Preview drafts persisted between preview and approval
//! - `service.rs` - The `PromptLibrary` lifecycle service
//! - `error.rs` - Library-specific error types

pub mod conversation;
mod draft;
mod error;
mod service;
#[cfg(test)]
pub mod testing;

pub use conversation::ConversationMessage;
pub use draft::{DraftCache, PendingDraft};
pub use error::LibraryError;
pub use service::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_USE_CASE_LIMIT, ImprovedPrompt, PromptDraft, PromptLibrary,
    SavedPrompt, UpdateOutcome, UpdateRequest,
};
