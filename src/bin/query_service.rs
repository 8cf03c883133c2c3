//! Query service: grounded question answering over the stored chunks.

use std::sync::Arc;

use ragline::clients::{HttpEmbeddingClient, HttpVectorIndexClient, OllamaGenerator};
use ragline::config::QueryConfig;
use ragline::query::QueryPipeline;
use ragline::server;

#[tokio::main]
async fn main() -> Result<(), ragline::PipelineError> {
    server::init_tracing();
    let config = QueryConfig::from_env()?;

    let embedding = Arc::new(HttpEmbeddingClient::new(config.embedding_url.clone())?);
    let index = Arc::new(HttpVectorIndexClient::new(config.vectordb_url.clone())?);
    let generation = Arc::new(OllamaGenerator::new(&config.ollama_url, &config.model)?);

    let pipeline = Arc::new(QueryPipeline::new(embedding, index, generation));
    server::serve(server::query::router(pipeline), &config.bind_addr).await
}
