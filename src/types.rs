//! Shared data and wire types used by the pipeline services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of an uploaded document.
///
/// A document is created in [`DocumentStatus::Processing`] and moves
/// exactly once to one of the terminal states. There is no transition out
/// of a terminal state short of a fresh upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "processing" => Some(DocumentStatus::Processing),
            "completed" => Some(DocumentStatus::Completed),
            "failed" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states never revert.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DocumentStatus::Processing)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of one uploaded document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

/// One retrieved chunk with the index's raw score attached.
///
/// `score` is whatever distance or similarity metric the vector index
/// reports; callers must not reinterpret it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    pub doc_id: i64,
}

/// Attribution entry returned alongside a generated answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceRef {
    pub doc_id: i64,
    pub score: f32,
}

/// Final result of one query round trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Outcome of a successful ingestion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub doc_id: i64,
    pub chunks: usize,
}

// Wire payloads shared between the HTTP servers and their clients.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedBatchRequest {
    pub doc_id: i64,
    pub chunks: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreRequest {
    pub doc_id: i64,
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub embedding: Vec<f32>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}
