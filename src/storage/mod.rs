//! Prompt persistence.
//!
//! The [`PromptStore`] trait is the narrow seam between the prompt lifecycle
//! and the backing database; [`mongo`] provides the MongoDB implementation.

pub mod models;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

pub use models::{NewPrompt, PromptPatch, PromptRecord, SearchHit, UseCase};
pub use mongo::MongoPromptStore;

/// Score attached to results when similarity ranking was unavailable and an
/// arbitrary page was returned instead. Callers seeing this value must treat
/// the result set as unranked.
pub const UNRANKED_SCORE: f64 = 0.5;

/// Errors from the prompt store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach or authenticate with the database.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The given id is not a well-formed store id.
    #[error("Malformed prompt id '{0}'")]
    InvalidId(String),

    /// A read or write failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// A stored document could not be mapped to a record.
    #[error("Malformed document: {0}")]
    Document(String),
}

/// Persistence operations needed by the prompt lifecycle.
///
/// Ids are opaque strings assigned by the store. Implementations must apply
/// each [`PromptPatch`] as a single atomic write: field overwrites, the
/// `last_updated` stamp, the counter increment, and the changelog append all
/// land together or not at all.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Insert a new prompt and return its assigned id.
    async fn insert(&self, prompt: NewPrompt) -> Result<String, StoreError>;

    /// Fetch a prompt by id. `Ok(None)` when the id does not resolve.
    async fn fetch(&self, id: &str) -> Result<Option<PromptRecord>, StoreError>;

    /// Apply a partial update. Returns whether a document was modified;
    /// `false` means the id no longer resolved at write time.
    async fn apply_patch(&self, id: &str, patch: PromptPatch) -> Result<bool, StoreError>;

    /// Similarity search over stored embeddings, best match first. Only hits
    /// scoring at least `min_score` are returned.
    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Prompts in a category, most recently updated first.
    async fn find_by_use_case(
        &self,
        use_case: UseCase,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, StoreError>;

    /// An arbitrary page of prompts, used as the unranked fallback when
    /// similarity search is unavailable.
    async fn sample_page(&self, limit: usize) -> Result<Vec<PromptRecord>, StoreError>;
}
