//! HTTP surface shared plumbing: error responses, tracing setup, and the
//! serve loop used by every service binary.

pub mod embedding;
pub mod ingestion;
pub mod query;
pub mod vectordb;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::PipelineError;

/// Pipeline errors rendered as `{"detail": ...}` JSON bodies.
/// Unsupported input is the caller's fault; everything else is a 500.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::UnsupportedFile(_) | PipelineError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

/// Installs the fmt subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Binds `addr` and serves `router` until the process exits.
pub async fn serve(router: Router, addr: &str) -> Result<(), PipelineError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(PipelineError::Io)
}
