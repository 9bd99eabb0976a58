//! External AI service providers.
//!
//! The lifecycle service talks to the embedding and completion providers
//! through the traits defined here; the adapters wrap the vendor HTTP APIs
//! with reqwest.

pub mod completion;
pub mod embedding;

use thiserror::Error;

pub use completion::{CompletionProvider, ConversationAnalysis, OpenAiCompletions};
pub use embedding::{EmbeddingProvider, VoyageEmbeddings};

/// Errors from the embedding and completion providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider's API key was not configured.
    #[error("{provider} API key is not configured")]
    MissingCredentials { provider: &'static str },

    /// The HTTP request failed or the provider returned an error status.
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    /// The provider answered, but the payload was empty or malformed.
    #[error("{provider} returned an unexpected response: {message}")]
    Response {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn request(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            provider,
            message: message.into(),
        }
    }

    pub fn response(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Response {
            provider,
            message: message.into(),
        }
    }
}
