//! Embedding service routes: single-text embed, batch embed-and-store,
//! and health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::clients::VectorIndex;
use crate::embeddings::EmbeddingBackend;
use crate::types::{EmbedBatchRequest, EmbedRequest, EmbedResponse};

use super::ApiError;

/// Process-scoped handles: the model stays loaded for the service's
/// lifetime and is threaded through explicitly rather than held globally.
pub struct EmbeddingState {
    pub backend: Arc<dyn EmbeddingBackend>,
    pub index: Arc<dyn VectorIndex>,
}

pub fn router(state: Arc<EmbeddingState>) -> Router {
    Router::new()
        .route("/embed", post(embed))
        .route("/embed-batch", post(embed_batch))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<Arc<EmbeddingState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "embedding",
        "model": state.backend.model_id(),
    }))
}

/// `POST /embed` — one text to one vector, used by the query service.
async fn embed(
    State(state): State<Arc<EmbeddingState>>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let embedding = state.backend.embed(&request.text).await?;
    Ok(Json(EmbedResponse { embedding }))
}

/// `POST /embed-batch` — embeds a document's chunks and forwards them to
/// vector storage. This is the store pipeline the ingestion service
/// retries against.
async fn embed_batch(
    State(state): State<Arc<EmbeddingState>>,
    Json(request): Json<EmbedBatchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let embeddings = state.backend.embed_batch(&request.chunks).await?;
    let stored = state
        .index
        .store(request.doc_id, &request.chunks, &embeddings)
        .await?;
    tracing::info!(doc_id = request.doc_id, stored, "embedded and stored batch");
    Ok(Json(json!({
        "message": "Embeddings generated and stored",
        "chunks": stored,
    })))
}
