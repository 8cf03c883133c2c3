//! Ingestion orchestrator: drives an uploaded document through
//! extract -> chunk -> embed+store, tracking its status through failure.
//!
//! The document record is created before extraction so every upload,
//! including one that dies in extraction, leaves an inspectable record.
//! The embed+store stage is the only retried step: it talks to a
//! downstream service that may still be starting up, so it gets a fixed
//! number of attempts with a fixed sleep between them. Everything else
//! fails the document immediately.

use std::sync::Arc;

use crate::chunker::Chunker;
use crate::clients::{EmbeddingStage, VectorIndex};
use crate::config::RetryPolicy;
use crate::documents::SqliteDocumentStore;
use crate::error::PipelineError;
use crate::extract::ExtractorRegistry;
use crate::types::{Document, DocumentStatus, IngestReceipt};

pub struct IngestionPipeline {
    documents: SqliteDocumentStore,
    extractors: ExtractorRegistry,
    chunker: Chunker,
    embedding: Arc<dyn EmbeddingStage>,
    index: Arc<dyn VectorIndex>,
    retry: RetryPolicy,
}

impl IngestionPipeline {
    pub fn new(
        documents: SqliteDocumentStore,
        extractors: ExtractorRegistry,
        chunker: Chunker,
        embedding: Arc<dyn EmbeddingStage>,
        index: Arc<dyn VectorIndex>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            documents,
            extractors,
            chunker,
            embedding,
            index,
            retry,
        }
    }

    /// Runs one document's lifecycle. On success the record ends
    /// `completed`; on any stage failure it ends `failed` and the error is
    /// surfaced with its cause.
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestReceipt, PipelineError> {
        let doc_id = self.documents.create(filename).await?;
        tracing::info!(doc_id, filename, "document registered, processing");

        match self.run_stages(doc_id, filename, bytes).await {
            Ok(chunks) => {
                self.documents
                    .set_status(doc_id, DocumentStatus::Completed)
                    .await?;
                tracing::info!(doc_id, chunks, "ingestion completed");
                Ok(IngestReceipt { doc_id, chunks })
            }
            Err(err) => {
                if let Err(status_err) = self
                    .documents
                    .set_status(doc_id, DocumentStatus::Failed)
                    .await
                {
                    // Keep the original failure; the status write is secondary.
                    tracing::warn!(doc_id, error = %status_err, "could not mark document failed");
                }
                tracing::warn!(doc_id, error = %err, "ingestion failed");
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        doc_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<usize, PipelineError> {
        let text = self.extractors.extract(filename, bytes)?;
        let chunks = self.chunker.split(&text);
        if chunks.is_empty() {
            tracing::info!(doc_id, "document produced no chunks, nothing to store");
            return Ok(0);
        }
        self.store_with_retry(doc_id, &chunks).await
    }

    /// Sends the chunks through the embed+store pipeline, retrying
    /// downstream failures up to the configured attempt count with a fixed
    /// delay. The sleep is deliberate backpressure against a service that
    /// is still starting up.
    async fn store_with_retry(
        &self,
        doc_id: i64,
        chunks: &[String],
    ) -> Result<usize, PipelineError> {
        let mut attempt = 1usize;
        loop {
            match self.embedding.embed_and_store(doc_id, chunks).await {
                Ok(stored) => return Ok(stored),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    tracing::warn!(
                        doc_id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %err,
                        "store pipeline unavailable, retrying after delay"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Lists all document records.
    pub async fn list_documents(&self) -> Result<Vec<Document>, PipelineError> {
        self.documents.list().await
    }

    /// Deletes a document record and, best effort, its vector records.
    /// A failed cascade delete is logged and swallowed so the document
    /// never becomes undeletable; orphaned vectors are the accepted cost.
    pub async fn delete_document(&self, doc_id: i64) -> Result<(), PipelineError> {
        self.documents.delete(doc_id).await?;
        if let Err(err) = self.index.delete_document(doc_id).await {
            tracing::warn!(doc_id, error = %err, "vector cascade delete failed, leaving orphans");
        }
        Ok(())
    }
}
