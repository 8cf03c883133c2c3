//! Ingestion service routes: upload, list, delete.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::error::PipelineError;
use crate::ingest::IngestionPipeline;
use crate::types::Document;

use super::ApiError;

/// Builds the ingestion router over a shared pipeline handle.
pub fn router(pipeline: Arc<IngestionPipeline>) -> Router {
    Router::new()
        .route("/upload", axum::routing::post(upload))
        .route("/documents", get(list_documents))
        .route("/documents/{id}", axum::routing::delete(delete_document))
        .with_state(pipeline)
}

/// `POST /upload` — multipart upload; the `file` part carries the document.
async fn upload(
    State(pipeline): State<Arc<IngestionPipeline>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PipelineError::InvalidRequest(err.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("upload")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| PipelineError::InvalidRequest(err.to_string()))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| PipelineError::InvalidRequest("missing file part".into()))?;

    let receipt = pipeline.ingest(&filename, &bytes).await?;
    Ok(Json(json!({
        "message": "Document processed successfully",
        "doc_id": receipt.doc_id,
        "chunks": receipt.chunks,
    })))
}

/// `GET /documents` — every record with its current status.
async fn list_documents(
    State(pipeline): State<Arc<IngestionPipeline>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(pipeline.list_documents().await?))
}

/// `DELETE /documents/{id}` — removes the record and, best effort, the
/// document's vectors. Succeeds even when the cascade fails.
async fn delete_document(
    State(pipeline): State<Arc<IngestionPipeline>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    pipeline.delete_document(id).await?;
    Ok(Json(json!({ "message": "Document deleted" })))
}
