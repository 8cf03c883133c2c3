//! Downstream service capabilities, one trait per collaborator.
//!
//! The orchestrators depend on these traits rather than on concrete HTTP
//! clients, so tests substitute in-process fakes without a live network.
//! Every HTTP call is a blocking round trip with an explicit timeout;
//! a connection failure or non-success status surfaces as
//! [`PipelineError::Downstream`], the only retryable error class.

pub mod embedding;
pub mod generation;
pub mod vector;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::ScoredChunk;

pub use embedding::HttpEmbeddingClient;
pub use generation::OllamaGenerator;
pub use vector::HttpVectorIndexClient;

/// The embedding service: single-text embedding for queries, and the
/// batch embed-and-store pipeline that ingestion retries against.
#[async_trait]
pub trait EmbeddingStage: Send + Sync {
    /// Embeds one text (the query path).
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// Embeds a document's chunks and forwards them to vector storage.
    /// Returns the number of chunks processed.
    async fn embed_and_store(
        &self,
        doc_id: i64,
        chunks: &[String],
    ) -> Result<usize, PipelineError>;
}

/// The vector index: store, nearest-neighbour search, cascade delete.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persists (chunk, embedding) pairs under the document's id.
    async fn store(
        &self,
        doc_id: i64,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, PipelineError>;

    /// Returns the `top_k` chunks nearest to `embedding`, best first.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError>;

    /// Removes every vector record belonging to `doc_id`.
    async fn delete_document(&self, doc_id: i64) -> Result<(), PipelineError>;
}

/// The generation backend: grounded prompt in, answer text out.
#[async_trait]
pub trait Generation: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}
