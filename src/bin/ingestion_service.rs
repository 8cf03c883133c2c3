//! Ingestion service: accepts uploads, tracks document status, and drives
//! the embed+store pipeline.

use std::sync::Arc;

use ragline::chunker::Chunker;
use ragline::clients::{HttpEmbeddingClient, HttpVectorIndexClient};
use ragline::config::IngestionConfig;
use ragline::documents::SqliteDocumentStore;
use ragline::extract::ExtractorRegistry;
use ragline::ingest::IngestionPipeline;
use ragline::server;

#[tokio::main]
async fn main() -> Result<(), ragline::PipelineError> {
    server::init_tracing();
    let config = IngestionConfig::from_env()?;

    if let Some(dir) = config.documents_db.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let documents = SqliteDocumentStore::open(&config.documents_db).await?;
    let embedding = Arc::new(HttpEmbeddingClient::new(config.embedding_url.clone())?);
    let index = Arc::new(HttpVectorIndexClient::new(config.vectordb_url.clone())?);

    let pipeline = IngestionPipeline::new(
        documents,
        ExtractorRegistry::with_defaults(),
        Chunker::new(config.chunk_max_size, config.chunk_overlap)?,
        embedding,
        index,
        config.retry,
    );

    server::serve(
        server::ingestion::router(Arc::new(pipeline)),
        &config.bind_addr,
    )
    .await
}
