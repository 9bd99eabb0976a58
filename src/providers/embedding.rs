//! Text embedding provider.
//!
//! [`VoyageEmbeddings`] wraps the Voyage AI embeddings endpoint. The single
//! and batch variants share one request path since the API takes a list of
//! inputs either way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::core::config::EmbeddingConfig;

/// Service interface for generating text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding vector for one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Generate embeddings for multiple texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Voyage AI embedding client.
#[derive(Clone)]
pub struct VoyageEmbeddings {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl VoyageEmbeddings {
    /// Provider name used in error messages.
    pub const PROVIDER: &'static str = "Voyage AI";

    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.voyageai.com/v1";

    /// Default embedding model.
    pub const DEFAULT_MODEL: &'static str = "voyage-3-large";

    /// Create a new client with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a client from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials {
                provider: Self::PROVIDER,
            })?;
        Ok(Self::new(api_key).with_model(config.model.clone()))
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        let request = EmbeddingRequest {
            input,
            model: self.model.clone(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::request(Self::PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::request(
                Self::PROVIDER,
                format!("API returned status: {} - {}", status, body),
            ));
        }

        let response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::response(Self::PROVIDER, e.to_string()))?;

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut embeddings = self.request(vec![text.to_string()]).await?;
        if embeddings.is_empty() {
            return Err(ProviderError::response(
                Self::PROVIDER,
                "no embedding generated",
            ));
        }
        Ok(embeddings.swap_remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.request(texts.to_vec()).await?;
        if embeddings.is_empty() {
            return Err(ProviderError::response(
                Self::PROVIDER,
                "no embeddings generated",
            ));
        }
        Ok(embeddings)
    }
}
