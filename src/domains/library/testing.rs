//! Test fixtures: a [`PromptLibrary`] wired to inert in-memory collaborators.
//!
//! Tool, router, and registry tests need a library instance but not real
//! MongoDB or provider traffic. The stubs here answer every call with fixed
//! data and never fail.

use std::sync::Arc;

use async_trait::async_trait;

use super::conversation::ConversationMessage;
use super::service::PromptLibrary;
use crate::providers::{
    CompletionProvider, ConversationAnalysis, EmbeddingProvider, ProviderError,
};
use crate::storage::{
    NewPrompt, PromptPatch, PromptRecord, PromptStore, SearchHit, StoreError, UseCase,
};

struct StubStore;

#[async_trait]
impl PromptStore for StubStore {
    async fn insert(&self, _prompt: NewPrompt) -> Result<String, StoreError> {
        Ok("64b0c5f2aa11223344556677".to_string())
    }

    async fn fetch(&self, _id: &str) -> Result<Option<PromptRecord>, StoreError> {
        Ok(None)
    }

    async fn apply_patch(&self, _id: &str, _patch: PromptPatch) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn similarity_search(
        &self,
        _query: &[f32],
        _limit: usize,
        _min_score: f64,
    ) -> Result<Vec<SearchHit>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_by_use_case(
        &self,
        _use_case: UseCase,
        _limit: usize,
    ) -> Result<Vec<PromptRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn sample_page(&self, _limit: usize) -> Result<Vec<PromptRecord>, StoreError> {
        Ok(Vec::new())
    }
}

struct StubEmbeddings;

#[async_trait]
impl EmbeddingProvider for StubEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(vec![0.0; 4])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
    }
}

struct StubCompletions;

#[async_trait]
impl CompletionProvider for StubCompletions {
    async fn analyze_conversation(
        &self,
        _messages: &[ConversationMessage],
        _task_description: Option<&str>,
    ) -> Result<ConversationAnalysis, ProviderError> {
        Ok(ConversationAnalysis {
            use_case: UseCase::General,
            summary: "Stub summary".to_string(),
            prompt_template: "# Stub\n\nDo the thing.".to_string(),
            history: "Stubbed".to_string(),
        })
    }

    async fn revise_template(
        &self,
        _template: &str,
        _feedback: &str,
        _context: Option<&str>,
    ) -> Result<String, ProviderError> {
        Ok("# Stub\n\nDo the thing better.".to_string())
    }
}

/// Build a library over the stub collaborators.
pub fn stub_library() -> Arc<PromptLibrary> {
    Arc::new(PromptLibrary::new(
        Arc::new(StubStore),
        Arc::new(StubEmbeddings),
        Arc::new(StubCompletions),
    ))
}
