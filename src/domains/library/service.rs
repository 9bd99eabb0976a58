//! Prompt lifecycle operations.
//!
//! [`PromptLibrary`] orchestrates the store and the two AI providers for
//! every tool operation. It holds no mutable state of its own; each call is
//! an independent async orchestration over the injected collaborators.
//!
//! One rule is load-bearing everywhere here: a new summary never reaches the
//! store without a freshly generated embedding in the same patch.

use std::sync::Arc;
use tracing::{info, warn};

use super::conversation::{normalize_template, parse_conversation_json};
use super::error::LibraryError;
use crate::providers::{CompletionProvider, EmbeddingProvider};
use crate::storage::{
    NewPrompt, PromptPatch, PromptRecord, PromptStore, SearchHit, UNRANKED_SCORE, UseCase,
};

/// Minimum similarity score for ranked search results.
const MIN_SCORE: f64 = 0.0;

/// Default result count for semantic search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Default result count for category search.
pub const DEFAULT_USE_CASE_LIMIT: usize = 10;

/// Outcome of creating a prompt.
#[derive(Debug, Clone)]
pub struct SavedPrompt {
    pub id: String,
    pub use_case: UseCase,
    pub summary: String,
}

/// A prompt draft: the analyzed conversation before (or instead of) a store
/// write. The same shape is accepted back by [`PromptLibrary::commit_draft`]
/// once a caller approves it.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDraft {
    pub use_case: UseCase,
    pub summary: String,
    pub prompt_template: String,
    pub history: String,
}

/// A requested partial update, field-for-field as the caller supplied it.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub change_description: String,
    pub prompt_template: Option<String>,
    pub summary: Option<String>,
    pub use_case: Option<UseCase>,
    pub history: Option<String>,
}

/// What an update did.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOutcome {
    /// Whether the store reported a modified document. `false` means the
    /// prompt vanished between fetch and write; it is reported, not retried.
    pub applied: bool,
    /// Whether a changed summary caused the embedding to be regenerated.
    pub embedding_refreshed: bool,
}

/// Outcome of an LLM-driven template improvement.
#[derive(Debug, Clone)]
pub struct ImprovedPrompt {
    pub applied: bool,
    pub template: String,
}

/// The prompt lifecycle service.
pub struct PromptLibrary {
    store: Arc<dyn PromptStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    completions: Arc<dyn CompletionProvider>,
}

impl PromptLibrary {
    pub fn new(
        store: Arc<dyn PromptStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        completions: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            store,
            embeddings,
            completions,
        }
    }

    /// Analyze a conversation and persist it as a new prompt.
    ///
    /// Validation happens before any provider call; the store insert is the
    /// last step, so earlier failures leave no partial document behind.
    pub async fn save_conversation(
        &self,
        conversation_json: &str,
        task_description: Option<&str>,
    ) -> Result<SavedPrompt, LibraryError> {
        let messages = parse_conversation_json(conversation_json)?;

        info!("Analyzing conversation");
        let analysis = self
            .completions
            .analyze_conversation(&messages, task_description)
            .await?;
        let prompt_template = normalize_template(&analysis.prompt_template);

        info!("Generating embedding");
        let embedding = self.embeddings.embed(&analysis.summary).await?;

        let id = self
            .store
            .insert(NewPrompt {
                use_case: analysis.use_case,
                summary: analysis.summary.clone(),
                prompt_template,
                history: analysis.history,
                embedding,
                created_by: None,
            })
            .await?;

        Ok(SavedPrompt {
            id,
            use_case: analysis.use_case,
            summary: analysis.summary,
        })
    }

    /// Analyze a conversation into a draft without touching the store or the
    /// embedding provider.
    pub async fn preview(
        &self,
        conversation_json: &str,
        task_description: Option<&str>,
    ) -> Result<PromptDraft, LibraryError> {
        let messages = parse_conversation_json(conversation_json)?;

        info!("Analyzing conversation for preview");
        let analysis = self
            .completions
            .analyze_conversation(&messages, task_description)
            .await?;

        Ok(PromptDraft {
            use_case: analysis.use_case,
            summary: analysis.summary,
            prompt_template: normalize_template(&analysis.prompt_template),
            history: analysis.history,
        })
    }

    /// Persist an approved draft verbatim: embed its summary and insert.
    /// No re-analysis and no re-normalization happen here.
    pub async fn commit_draft(&self, draft: PromptDraft) -> Result<SavedPrompt, LibraryError> {
        info!("Generating embedding for approved draft");
        let embedding = self.embeddings.embed(&draft.summary).await?;

        let id = self
            .store
            .insert(NewPrompt {
                use_case: draft.use_case,
                summary: draft.summary.clone(),
                prompt_template: draft.prompt_template,
                history: draft.history,
                embedding,
                created_by: None,
            })
            .await?;

        Ok(SavedPrompt {
            id,
            use_case: draft.use_case,
            summary: draft.summary,
        })
    }

    /// Apply a partial update. A supplied summary that differs from the
    /// stored one triggers embedding regeneration in the same patch.
    pub async fn update(
        &self,
        id: &str,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, LibraryError> {
        let existing = self.fetch_details(id).await?;

        let mut embedding = None;
        if let Some(ref new_summary) = request.summary {
            if *new_summary != existing.summary {
                info!("Summary changed, regenerating embedding");
                embedding = Some(self.embeddings.embed(new_summary).await?);
            }
        }
        let embedding_refreshed = embedding.is_some();

        info!("Updating prompt {}", id);
        let applied = self
            .store
            .apply_patch(
                id,
                PromptPatch {
                    use_case: request.use_case,
                    summary: request.summary,
                    prompt_template: request.prompt_template,
                    history: request.history,
                    embedding,
                    changelog_entry: request.change_description,
                },
            )
            .await?;

        Ok(UpdateOutcome {
            applied,
            embedding_refreshed,
        })
    }

    /// Revise a prompt's template from feedback and persist the result.
    ///
    /// The summary, category, and history never change here. The embedding
    /// is refreshed from the unchanged summary anyway: one extra provider
    /// call buys an unconditionally consistent record.
    pub async fn improve(
        &self,
        id: &str,
        feedback: &str,
        context: Option<&str>,
    ) -> Result<ImprovedPrompt, LibraryError> {
        let existing = self.fetch_details(id).await?;

        info!("Improving prompt {} based on feedback", id);
        let template = self
            .completions
            .revise_template(&existing.prompt_template, feedback, context)
            .await?;

        let embedding = self.embeddings.embed(&existing.summary).await?;

        let applied = self
            .store
            .apply_patch(
                id,
                PromptPatch {
                    prompt_template: Some(template.clone()),
                    embedding: Some(embedding),
                    changelog_entry: format!("Improved prompt based on feedback: {}", feedback),
                    ..Default::default()
                },
            )
            .await?;

        Ok(ImprovedPrompt { applied, template })
    }

    /// Semantic search over stored prompts, best match first.
    ///
    /// When the similarity index is unavailable the store's error is
    /// swallowed and an arbitrary page is returned instead, every hit scored
    /// with [`UNRANKED_SCORE`] so callers can tell the set is unranked.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, LibraryError> {
        info!("Generating embedding for query");
        let vector = self.embeddings.embed(query).await?;

        match self.store.similarity_search(&vector, limit, MIN_SCORE).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                warn!("Similarity search unavailable ({}), falling back to unranked page", e);
                let page = self.store.sample_page(limit).await?;
                Ok(page
                    .into_iter()
                    .map(|record| SearchHit {
                        id: record.id,
                        use_case: record.use_case,
                        summary: record.summary,
                        score: UNRANKED_SCORE,
                        last_updated: record.last_updated,
                    })
                    .collect())
            }
        }
    }

    /// Prompts in a category, most recently updated first.
    pub async fn search_by_use_case(
        &self,
        use_case: UseCase,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, LibraryError> {
        info!("Searching prompts for use case: {}", use_case);
        Ok(self.store.find_by_use_case(use_case, limit).await?)
    }

    /// Fetch the full record for an id.
    pub async fn fetch_details(&self, id: &str) -> Result<PromptRecord, LibraryError> {
        match self.store.fetch(id).await? {
            Some(record) => Ok(record),
            None => Err(LibraryError::not_found(id)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ConversationAnalysis, ProviderError};
    use crate::storage::StoreError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const CONVERSATION: &str =
        r#"[{"role":"user","content":"Write a CSV parser"},{"role":"assistant","content":"Done"}]"#;

    struct MockEmbeddings {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockEmbeddings {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddings {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(ProviderError::request("Voyage AI", "unreachable"));
            }
            Ok(vec![0.1, 0.2, 0.3])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    struct MockCompletions {
        analysis: ConversationAnalysis,
        revised: String,
        analyze_calls: Mutex<usize>,
        revise_calls: Mutex<usize>,
    }

    impl MockCompletions {
        fn new() -> Self {
            Self {
                analysis: ConversationAnalysis {
                    use_case: UseCase::CodeGen,
                    summary: "Parses CSV files".to_string(),
                    // No leading '#', so normalization must kick in.
                    prompt_template: "Parse the given CSV.".to_string(),
                    history: "Solved in one pass".to_string(),
                },
                revised: "# Improved\n\nParse the CSV carefully.".to_string(),
                analyze_calls: Mutex::new(0),
                revise_calls: Mutex::new(0),
            }
        }

        fn analyze_count(&self) -> usize {
            *self.analyze_calls.lock().unwrap()
        }

        fn revise_count(&self) -> usize {
            *self.revise_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for MockCompletions {
        async fn analyze_conversation(
            &self,
            _messages: &[crate::domains::library::conversation::ConversationMessage],
            _task_description: Option<&str>,
        ) -> Result<ConversationAnalysis, ProviderError> {
            *self.analyze_calls.lock().unwrap() += 1;
            Ok(self.analysis.clone())
        }

        async fn revise_template(
            &self,
            _template: &str,
            _feedback: &str,
            _context: Option<&str>,
        ) -> Result<String, ProviderError> {
            *self.revise_calls.lock().unwrap() += 1;
            Ok(self.revised.clone())
        }
    }

    #[derive(Default)]
    struct MockStore {
        records: Mutex<HashMap<String, PromptRecord>>,
        inserts: Mutex<Vec<NewPrompt>>,
        patches: Mutex<Vec<(String, PromptPatch)>>,
        hits: Mutex<Vec<SearchHit>>,
        similarity_unavailable: bool,
        reject_patch: bool,
    }

    impl MockStore {
        fn with_record(record: PromptRecord) -> Self {
            let store = Self::default();
            store
                .records
                .lock()
                .unwrap()
                .insert(record.id.clone(), record);
            store
        }

        fn inserts(&self) -> Vec<NewPrompt> {
            self.inserts.lock().unwrap().clone()
        }

        fn patches(&self) -> Vec<(String, PromptPatch)> {
            self.patches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PromptStore for MockStore {
        async fn insert(&self, prompt: NewPrompt) -> Result<String, StoreError> {
            self.inserts.lock().unwrap().push(prompt);
            Ok("64b0c5f2aa11223344556677".to_string())
        }

        async fn fetch(&self, id: &str) -> Result<Option<PromptRecord>, StoreError> {
            Ok(self.records.lock().unwrap().get(id).cloned())
        }

        async fn apply_patch(&self, id: &str, patch: PromptPatch) -> Result<bool, StoreError> {
            self.patches.lock().unwrap().push((id.to_string(), patch));
            Ok(!self.reject_patch)
        }

        async fn similarity_search(
            &self,
            _query: &[f32],
            _limit: usize,
            _min_score: f64,
        ) -> Result<Vec<SearchHit>, StoreError> {
            if self.similarity_unavailable {
                return Err(StoreError::Query("no vector index".to_string()));
            }
            Ok(self.hits.lock().unwrap().clone())
        }

        async fn find_by_use_case(
            &self,
            use_case: UseCase,
            _limit: usize,
        ) -> Result<Vec<PromptRecord>, StoreError> {
            let mut records: Vec<_> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.use_case == use_case)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
            Ok(records)
        }

        async fn sample_page(&self, limit: usize) -> Result<Vec<PromptRecord>, StoreError> {
            let records: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
            Ok(records.into_iter().take(limit).collect())
        }
    }

    fn stored_record(id: &str) -> PromptRecord {
        PromptRecord {
            id: id.to_string(),
            use_case: UseCase::General,
            summary: "Existing summary".to_string(),
            prompt_template: "# Existing\n\nDo it.".to_string(),
            history: "Old history".to_string(),
            embedding: Some(vec![0.4, 0.5]),
            last_updated: Utc::now(),
            num_updates: 1,
            changelog: vec!["created".to_string()],
            created_by: None,
        }
    }

    fn library(
        store: Arc<MockStore>,
        embeddings: Arc<MockEmbeddings>,
        completions: Arc<MockCompletions>,
    ) -> PromptLibrary {
        PromptLibrary::new(store, embeddings, completions)
    }

    #[tokio::test]
    async fn test_save_conversation_happy_path() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let saved = lib.save_conversation(CONVERSATION, Some("parse csv")).await.unwrap();

        assert_eq!(saved.id, "64b0c5f2aa11223344556677");
        assert_eq!(saved.use_case, UseCase::CodeGen);
        assert_eq!(saved.summary, "Parses CSV files");

        assert_eq!(completions.analyze_count(), 1);
        // The embedding is computed from the summary, exactly once.
        assert_eq!(embeddings.calls(), vec!["Parses CSV files"]);

        let inserts = store.inserts();
        assert_eq!(inserts.len(), 1);
        assert_eq!(
            inserts[0].prompt_template,
            "# Prompt Template\n\nParse the given CSV."
        );
        assert_eq!(inserts[0].use_case, UseCase::CodeGen);
        assert_eq!(inserts[0].created_by, None);
        assert_eq!(inserts[0].embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_save_conversation_invalid_json_makes_no_external_calls() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let err = lib.save_conversation("not json", None).await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput(_)));

        assert_eq!(completions.analyze_count(), 0);
        assert!(embeddings.calls().is_empty());
        assert!(store.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_save_conversation_empty_array_rejected_before_calls() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let err = lib.save_conversation("[]", None).await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput(_)));
        assert_eq!(completions.analyze_count(), 0);
        assert!(store.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_preview_runs_analysis_only() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let draft = lib.preview(CONVERSATION, None).await.unwrap();

        assert_eq!(draft.use_case, UseCase::CodeGen);
        assert_eq!(draft.prompt_template, "# Prompt Template\n\nParse the given CSV.");
        assert_eq!(completions.analyze_count(), 1);
        assert!(embeddings.calls().is_empty());
        assert!(store.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_commit_draft_uses_fields_verbatim() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let draft = PromptDraft {
            use_case: UseCase::Creative,
            summary: "Approved summary".to_string(),
            // No heading: the commit path must not re-normalize.
            prompt_template: "plain template body".to_string(),
            history: "approved".to_string(),
        };
        let saved = lib.commit_draft(draft).await.unwrap();

        assert_eq!(saved.use_case, UseCase::Creative);
        assert_eq!(completions.analyze_count(), 0);
        assert_eq!(embeddings.calls(), vec!["Approved summary"]);

        let inserts = store.inserts();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].prompt_template, "plain template body");
    }

    #[tokio::test]
    async fn test_update_changed_summary_regenerates_embedding() {
        let store = Arc::new(MockStore::with_record(stored_record("id-1")));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let outcome = lib
            .update(
                "id-1",
                UpdateRequest {
                    change_description: "Rewrote the summary".to_string(),
                    summary: Some("Fresh summary".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(outcome.applied);
        assert!(outcome.embedding_refreshed);
        assert_eq!(embeddings.calls(), vec!["Fresh summary"]);

        let patches = store.patches();
        assert_eq!(patches.len(), 1);
        let (id, patch) = &patches[0];
        assert_eq!(id, "id-1");
        assert_eq!(patch.summary.as_deref(), Some("Fresh summary"));
        assert!(patch.embedding.is_some());
        assert_eq!(patch.changelog_entry, "Rewrote the summary");
    }

    #[tokio::test]
    async fn test_update_identical_summary_skips_embedding() {
        let store = Arc::new(MockStore::with_record(stored_record("id-1")));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let outcome = lib
            .update(
                "id-1",
                UpdateRequest {
                    change_description: "No-op summary".to_string(),
                    summary: Some("Existing summary".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!outcome.embedding_refreshed);
        assert!(embeddings.calls().is_empty());
        let patches = store.patches();
        assert!(patches[0].1.embedding.is_none());
        // The field itself is still written.
        assert_eq!(patches[0].1.summary.as_deref(), Some("Existing summary"));
    }

    #[tokio::test]
    async fn test_update_unrelated_fields_leave_summary_untouched() {
        let store = Arc::new(MockStore::with_record(stored_record("id-1")));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let outcome = lib
            .update(
                "id-1",
                UpdateRequest {
                    change_description: "Tightened wording".to_string(),
                    prompt_template: Some("# New\n\nBetter.".to_string()),
                    history: Some("Another run".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(outcome.applied);
        assert!(!outcome.embedding_refreshed);
        assert!(embeddings.calls().is_empty());

        let patches = store.patches();
        let patch = &patches[0].1;
        assert!(patch.summary.is_none());
        assert!(patch.embedding.is_none());
        assert_eq!(patch.prompt_template.as_deref(), Some("# New\n\nBetter."));
    }

    #[tokio::test]
    async fn test_update_missing_prompt_is_not_found() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let err = lib
            .update(
                "missing",
                UpdateRequest {
                    change_description: "x".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::NotFound(_)));
        assert!(embeddings.calls().is_empty());
        assert!(store.patches().is_empty());
    }

    #[tokio::test]
    async fn test_update_reports_unapplied_write() {
        let store = Arc::new(MockStore {
            reject_patch: true,
            ..Default::default()
        });
        store
            .records
            .lock()
            .unwrap()
            .insert("id-1".to_string(), stored_record("id-1"));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let outcome = lib
            .update(
                "id-1",
                UpdateRequest {
                    change_description: "x".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!outcome.applied);
    }

    #[tokio::test]
    async fn test_improve_revises_template_and_refreshes_embedding() {
        let store = Arc::new(MockStore::with_record(stored_record("id-1")));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let improved = lib
            .improve("id-1", "needs stricter output format", None)
            .await
            .unwrap();

        assert!(improved.applied);
        assert_eq!(improved.template, "# Improved\n\nParse the CSV carefully.");
        assert_eq!(completions.revise_count(), 1);
        // The embedding source is the unchanged stored summary.
        assert_eq!(embeddings.calls(), vec!["Existing summary"]);

        let patches = store.patches();
        assert_eq!(patches.len(), 1);
        let patch = &patches[0].1;
        assert_eq!(
            patch.prompt_template.as_deref(),
            Some("# Improved\n\nParse the CSV carefully.")
        );
        assert!(patch.embedding.is_some());
        // Summary, category, and history are never touched by improve.
        assert!(patch.summary.is_none());
        assert!(patch.use_case.is_none());
        assert!(patch.history.is_none());
        assert_eq!(
            patch.changelog_entry,
            "Improved prompt based on feedback: needs stricter output format"
        );
    }

    #[tokio::test]
    async fn test_improve_missing_prompt_makes_no_provider_calls() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let err = lib.improve("missing", "feedback", None).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
        assert_eq!(completions.revise_count(), 0);
        assert!(embeddings.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_returns_ranked_hits() {
        let store = Arc::new(MockStore::default());
        store.hits.lock().unwrap().push(SearchHit {
            id: "id-1".to_string(),
            use_case: UseCase::CodeGen,
            summary: "Parses CSV files".to_string(),
            score: 0.91,
            last_updated: Utc::now(),
        });
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let hits = lib.search("csv parsing", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 0.91).abs() < f64::EPSILON);
        assert_eq!(embeddings.calls(), vec!["csv parsing"]);
    }

    #[tokio::test]
    async fn test_search_falls_back_to_unranked_page() {
        let store = Arc::new(MockStore {
            similarity_unavailable: true,
            ..Default::default()
        });
        store
            .records
            .lock()
            .unwrap()
            .insert("id-1".to_string(), stored_record("id-1"));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let hits = lib.search("anything", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        // Every fallback hit carries the neutral sentinel score.
        assert!(hits.iter().all(|h| h.score == UNRANKED_SCORE));
    }

    #[tokio::test]
    async fn test_search_embedding_failure_propagates() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::failing());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let err = lib.search("query", 5).await.unwrap_err();
        assert!(matches!(err, LibraryError::Provider(_)));
    }

    #[tokio::test]
    async fn test_search_by_use_case_orders_most_recent_first() {
        let store = Arc::new(MockStore::default());
        let mut older = stored_record("id-old");
        older.last_updated = Utc::now() - chrono::Duration::hours(2);
        let newer = stored_record("id-new");
        store.records.lock().unwrap().insert(older.id.clone(), older);
        store.records.lock().unwrap().insert(newer.id.clone(), newer);
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        let records = lib.search_by_use_case(UseCase::General, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "id-new");
        assert_eq!(records[1].id, "id-old");
    }

    #[tokio::test]
    async fn test_fetch_details_not_found() {
        let store = Arc::new(MockStore::default());
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store, embeddings, completions);

        let err = lib.fetch_details("missing").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_each_mutation_sends_exactly_one_changelog_entry() {
        let store = Arc::new(MockStore::with_record(stored_record("id-1")));
        let embeddings = Arc::new(MockEmbeddings::new());
        let completions = Arc::new(MockCompletions::new());
        let lib = library(store.clone(), embeddings.clone(), completions.clone());

        lib.update(
            "id-1",
            UpdateRequest {
                change_description: "first".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        lib.improve("id-1", "second", None).await.unwrap();

        let patches = store.patches();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].1.changelog_entry, "first");
        assert_eq!(
            patches[1].1.changelog_entry,
            "Improved prompt based on feedback: second"
        );
    }
}
