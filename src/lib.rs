//! ```text
//! Upload ──► ingest::IngestionPipeline ──► extract ──► chunker
//!                     │                                   │
//!                     │ status: processing → {completed, failed}
//!                     ▼                                   ▼
//!            documents::SqliteDocumentStore    clients::EmbeddingStage
//!                                                         │ (retry ×5)
//!                                                         ▼
//!                                          vector_store::SqliteVectorStore
//!                                                         ▲
//! Question ──► query::QueryPipeline ──► embed ──► search ─┘
//!                     │
//!                     └──► prompt ──► clients::Generation ──► answer + sources
//! ```

pub mod chunker;
pub mod clients;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod query;
pub mod server;
pub mod types;
pub mod vector_store;

pub use error::PipelineError;
pub use types::{Document, DocumentStatus, IngestReceipt, QueryAnswer, ScoredChunk, SourceRef};
