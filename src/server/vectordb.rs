//! Vectordb service routes: store, search, cascade delete, health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::types::{ScoredChunk, SearchRequest, StoreRequest};
use crate::vector_store::SqliteVectorStore;

use super::ApiError;

pub fn router(store: Arc<SqliteVectorStore>) -> Router {
    Router::new()
        .route("/store", post(store_vectors))
        .route("/search", post(search_vectors))
        .route("/documents/{id}", delete(delete_document_vectors))
        .route("/health", get(health))
        .with_state(store)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "vectordb" }))
}

/// `POST /store` — upserts one record per chunk under `{doc_id}_{index}`.
async fn store_vectors(
    State(store): State<Arc<SqliteVectorStore>>,
    Json(request): Json<StoreRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = store
        .store(request.doc_id, &request.chunks, &request.embeddings)
        .await?;
    Ok(Json(json!({ "message": "Vectors stored", "count": count })))
}

/// `POST /search` — ranked nearest chunks, best (lowest distance) first.
async fn search_vectors(
    State(store): State<Arc<SqliteVectorStore>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<ScoredChunk>>, ApiError> {
    Ok(Json(store.search(&request.embedding, request.top_k).await?))
}

/// `DELETE /documents/{id}` — removes all records for the document;
/// no match is still a success.
async fn delete_document_vectors(
    State(store): State<Arc<SqliteVectorStore>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = store.delete_by_document(id).await?;
    tracing::info!(doc_id = id, deleted, "removed document vectors");
    Ok(Json(json!({ "message": "Document vectors deleted" })))
}
