//! Prompt-library error types.

use thiserror::Error;

use crate::providers::ProviderError;
use crate::storage::StoreError;

/// Errors that can occur during prompt lifecycle operations.
///
/// The tool layer turns every variant into an in-band `Error: ...` text
/// result; none of these surface as protocol faults.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Caller-supplied input failed validation. Raised before any external
    /// call is made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The given id did not resolve to a stored prompt.
    #[error("Prompt with ID {0} not found")]
    NotFound(String),

    /// An embedding or completion provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The preview draft file could not be read or written.
    #[error("Draft file error: {0}")]
    Draft(String),
}

impl LibraryError {
    /// Create a new "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a new "draft file" error.
    pub fn draft(msg: impl Into<String>) -> Self {
        Self::Draft(msg.into())
    }
}
