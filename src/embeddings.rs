//! Embedding model boundary for the embedding service.
//!
//! The model itself is a black box: text in, fixed-dimension vector out.
//! The Ollama backend covers real deployments; the hash backend gives
//! deterministic vectors for tests and model-less development setups.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PipelineError;

/// Maps text to fixed-dimension vectors. The dimension is constant for a
/// given backend and vectors from different backends are never mixed.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// Embeds a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Vector width produced by this backend.
    fn dimension(&self) -> usize;

    /// Model identifier reported on the health endpoint.
    fn model_id(&self) -> &str;
}

/// Backend that calls an Ollama-compatible embeddings endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Builds a client for `{base_url}/api/embeddings` using `model`.
    /// `dimension` must match what the model actually emits; responses of
    /// a different width are rejected rather than stored.
    pub fn new(base_url: &Url, model: &str, dimension: usize) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        let endpoint = base_url
            .join("api/embeddings")
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&OllamaEmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Embedding(format!(
                "embedding model returned {}",
                response.status()
            )));
        }

        let parsed: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;

        if parsed.embedding.len() != self.dimension {
            return Err(PipelineError::Embedding(format!(
                "model emitted {} dimensions, expected {}",
                parsed.embedding.len(),
                self.dimension
            )));
        }
        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Deterministic backend: same text always maps to the same unit vector.
/// No semantic signal, but stable ordering and dimensions, which is all
/// the pipeline tests need.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait]
impl EmbeddingBackend for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let mut hasher = std::hash::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            // Cheap xorshift over the text hash.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            vector.push(((state % 2000) as f32 / 1000.0) - 1.0);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "hash-embedder"
    }
}
