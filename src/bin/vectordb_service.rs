//! Vectordb service: durable vector records with ranked search.

use std::sync::Arc;

use ragline::config::VectorDbConfig;
use ragline::server;
use ragline::vector_store::SqliteVectorStore;

#[tokio::main]
async fn main() -> Result<(), ragline::PipelineError> {
    server::init_tracing();
    let config = VectorDbConfig::from_env()?;

    if let Some(dir) = config.vectors_db.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let store = Arc::new(SqliteVectorStore::open(&config.vectors_db).await?);
    server::serve(server::vectordb::router(store), &config.bind_addr).await
}
