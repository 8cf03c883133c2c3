//! Query service routes: question answering and health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::query::QueryPipeline;
use crate::types::{QueryAnswer, QueryRequest};

use super::ApiError;

pub fn router(pipeline: Arc<QueryPipeline>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /query` — embed, search, generate; errors surface immediately,
/// never as a partial answer.
async fn query(
    State(pipeline): State<Arc<QueryPipeline>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, ApiError> {
    Ok(Json(
        pipeline.answer(&request.question, request.top_k).await?,
    ))
}
