//! Embedding service: hosts the embedding model handle and forwards
//! embedded batches to vector storage.

use std::sync::Arc;

use ragline::clients::HttpVectorIndexClient;
use ragline::config::EmbeddingConfig;
use ragline::embeddings::OllamaEmbedder;
use ragline::server::{self, embedding::EmbeddingState};

#[tokio::main]
async fn main() -> Result<(), ragline::PipelineError> {
    server::init_tracing();
    let config = EmbeddingConfig::from_env()?;

    // One model handle for the process lifetime, passed in explicitly.
    let backend = Arc::new(OllamaEmbedder::new(
        &config.ollama_url,
        &config.model,
        config.dimension,
    )?);
    let index = Arc::new(HttpVectorIndexClient::new(config.vectordb_url.clone())?);

    tracing::info!(model = %config.model, dimension = config.dimension, "embedding backend ready");

    let state = Arc::new(EmbeddingState { backend, index });
    server::serve(server::embedding::router(state), &config.bind_addr).await
}
