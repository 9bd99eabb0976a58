//! MongoDB implementation of the prompt store.
//!
//! Documents are shaped by hand with `doc!` so the exact on-disk layout (field
//! names, update operators, pipeline stages) is visible in one place. Every
//! patch is issued as a single `update_one` carrying `$set`, `$inc`, and
//! `$push` together.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId},
    options::ClientOptions,
};
use std::time::Duration;
use tracing::{info, warn};

use super::{NewPrompt, PromptPatch, PromptRecord, PromptStore, SearchHit, StoreError, UseCase};
use crate::core::config::StorageConfig;

/// Atlas search index that holds the summary embeddings.
const VECTOR_INDEX: &str = "vector_index";

/// Candidate pool multiplier for the approximate nearest-neighbour stage.
const CANDIDATE_MULTIPLIER: usize = 10;

const SERVER_SELECTION_TIMEOUT_MS: u64 = 5000;
const MAX_POOL_SIZE: u32 = 50;
const MIN_POOL_SIZE: u32 = 10;

/// MongoDB-backed prompt store.
pub struct MongoPromptStore {
    collection: Collection<Document>,
}

impl MongoPromptStore {
    /// Connect to MongoDB and verify the connection with a ping.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.server_selection_timeout =
            Some(Duration::from_millis(SERVER_SELECTION_TIMEOUT_MS));
        options.max_pool_size = Some(MAX_POOL_SIZE);
        options.min_pool_size = Some(MIN_POOL_SIZE);

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        info!("Connected to MongoDB database: {}", config.database);

        Ok(Self { collection })
    }

    fn object_id(id: &str) -> Result<ObjectId, StoreError> {
        ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
    }
}

#[async_trait]
impl PromptStore for MongoPromptStore {
    async fn insert(&self, prompt: NewPrompt) -> Result<String, StoreError> {
        let document = new_prompt_document(&prompt, BsonDateTime::now());
        let result = self
            .collection
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let id = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        };
        info!("Created prompt with ID: {}", id);
        Ok(id)
    }

    async fn fetch(&self, id: &str) -> Result<Option<PromptRecord>, StoreError> {
        let oid = Self::object_id(id)?;
        let document = self
            .collection
            .find_one(doc! {"_id": oid})
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        document.map(record_from_document).transpose()
    }

    async fn apply_patch(&self, id: &str, patch: PromptPatch) -> Result<bool, StoreError> {
        let oid = Self::object_id(id)?;
        let update = patch_update_document(&patch, BsonDateTime::now());
        let result = self
            .collection
            .update_one(doc! {"_id": oid}, update)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.modified_count > 0 {
            info!("Updated prompt {}", id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let pipeline = vector_search_pipeline(query, limit, min_score);
        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        documents.into_iter().map(hit_from_document).collect()
    }

    async fn find_by_use_case(
        &self,
        use_case: UseCase,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, StoreError> {
        let cursor = self
            .collection
            .find(doc! {"use_case": use_case.as_str()})
            .sort(doc! {"last_updated": -1})
            .limit(limit as i64)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        documents.into_iter().map(record_from_document).collect()
    }

    async fn sample_page(&self, limit: usize) -> Result<Vec<PromptRecord>, StoreError> {
        let cursor = self
            .collection
            .find(doc! {})
            .limit(limit as i64)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        documents.into_iter().map(record_from_document).collect()
    }
}

// ============================================================================
// Document Shaping
// ============================================================================

/// Build the insert document for a new prompt.
fn new_prompt_document(prompt: &NewPrompt, now: BsonDateTime) -> Document {
    doc! {
        "use_case": prompt.use_case.as_str(),
        "summary": prompt.summary.clone(),
        "prompt_template": prompt.prompt_template.clone(),
        "history": prompt.history.clone(),
        "embedding": embedding_to_bson(&prompt.embedding),
        "last_updated": now,
        "num_updates": 0_i32,
        "changelog": Bson::Array(Vec::new()),
        "created_by": prompt.created_by.clone().map(Bson::String).unwrap_or(Bson::Null),
    }
}

/// Build the update-operator document for a patch.
///
/// `$set` carries the supplied fields plus the timestamp, `$inc` bumps the
/// counter, `$push` appends the changelog entry.
fn patch_update_document(patch: &PromptPatch, now: BsonDateTime) -> Document {
    let mut set_doc = doc! {"last_updated": now};
    if let Some(use_case) = patch.use_case {
        set_doc.insert("use_case", use_case.as_str());
    }
    if let Some(ref summary) = patch.summary {
        set_doc.insert("summary", summary.clone());
    }
    if let Some(ref template) = patch.prompt_template {
        set_doc.insert("prompt_template", template.clone());
    }
    if let Some(ref history) = patch.history {
        set_doc.insert("history", history.clone());
    }
    if let Some(ref embedding) = patch.embedding {
        set_doc.insert("embedding", embedding_to_bson(embedding));
    }

    doc! {
        "$set": set_doc,
        "$inc": {"num_updates": 1_i32},
        "$push": {"changelog": patch.changelog_entry.clone()},
    }
}

/// Build the `$vectorSearch` aggregation pipeline.
fn vector_search_pipeline(query: &[f32], limit: usize, min_score: f64) -> Vec<Document> {
    let query_vector: Vec<f64> = query.iter().map(|v| *v as f64).collect();
    vec![
        doc! {
            "$vectorSearch": {
                "index": VECTOR_INDEX,
                "path": "embedding",
                "queryVector": query_vector,
                "numCandidates": (limit * CANDIDATE_MULTIPLIER) as i32,
                "limit": limit as i32,
            }
        },
        doc! {
            "$project": {
                "_id": 1,
                "use_case": 1,
                "summary": 1,
                "prompt_template": 1,
                "history": 1,
                "last_updated": 1,
                "score": {"$meta": "vectorSearchScore"},
            }
        },
        doc! {"$match": {"score": {"$gte": min_score}}},
    ]
}

fn embedding_to_bson(values: &[f32]) -> Bson {
    Bson::Array(values.iter().map(|v| Bson::Double(*v as f64)).collect())
}

fn bson_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(d) => Some(*d),
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

fn document_id(doc: &Document) -> Result<String, StoreError> {
    match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => Ok(oid.to_hex()),
        Some(other) => Ok(other.to_string()),
        None => Err(StoreError::Document("missing _id".to_string())),
    }
}

fn document_use_case(doc: &Document) -> Result<UseCase, StoreError> {
    let raw = doc
        .get_str("use_case")
        .map_err(|_| StoreError::Document("missing use_case".to_string()))?;
    Ok(UseCase::parse(raw).unwrap_or_else(|| {
        warn!("Unknown stored use case '{}', treating as general", raw);
        UseCase::General
    }))
}

fn document_timestamp(doc: &Document) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    let dt = doc
        .get_datetime("last_updated")
        .map_err(|_| StoreError::Document("missing last_updated".to_string()))?;
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| StoreError::Document("last_updated out of range".to_string()))
}

/// Map a full stored document to a record.
fn record_from_document(doc: Document) -> Result<PromptRecord, StoreError> {
    let id = document_id(&doc)?;
    let use_case = document_use_case(&doc)?;
    let last_updated = document_timestamp(&doc)?;

    let summary = doc
        .get_str("summary")
        .map_err(|_| StoreError::Document("missing summary".to_string()))?
        .to_string();
    let prompt_template = doc
        .get_str("prompt_template")
        .map_err(|_| StoreError::Document("missing prompt_template".to_string()))?
        .to_string();
    let history = doc
        .get_str("history")
        .map_err(|_| StoreError::Document("missing history".to_string()))?
        .to_string();

    let embedding = match doc.get("embedding") {
        Some(Bson::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = bson_number(item).ok_or_else(|| {
                    StoreError::Document("non-numeric embedding component".to_string())
                })?;
                values.push(value as f32);
            }
            Some(values)
        }
        _ => None,
    };

    let num_updates = doc
        .get("num_updates")
        .and_then(bson_number)
        .map(|n| n as i64)
        .unwrap_or(0);

    let changelog = match doc.get("changelog") {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|b| b.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    };

    let created_by = match doc.get("created_by") {
        Some(Bson::String(s)) => Some(s.clone()),
        _ => None,
    };

    Ok(PromptRecord {
        id,
        use_case,
        summary,
        prompt_template,
        history,
        embedding,
        last_updated,
        num_updates,
        changelog,
        created_by,
    })
}

/// Map a search pipeline document to a hit.
fn hit_from_document(doc: Document) -> Result<SearchHit, StoreError> {
    let id = document_id(&doc)?;
    let use_case = document_use_case(&doc)?;
    let last_updated = document_timestamp(&doc)?;
    let summary = doc
        .get_str("summary")
        .map_err(|_| StoreError::Document("missing summary".to_string()))?
        .to_string();
    let score = doc.get("score").and_then(bson_number).unwrap_or(0.0);

    Ok(SearchHit {
        id,
        use_case,
        summary,
        score,
        last_updated,
    })
}

// ============================================================================
// Tests
// ============================================================================
