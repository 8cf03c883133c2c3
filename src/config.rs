//! Environment-resolved configuration for each service binary.
//!
//! Every knob is overridable via environment variables (a `.env` file is
//! honoured) and defaults to the well-known local service names, so the
//! compose setup works with no configuration at all.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::PipelineError;

/// Default downstream locations inside the compose network.
pub const DEFAULT_EMBEDDING_URL: &str = "http://embedding:8002";
pub const DEFAULT_VECTORDB_URL: &str = "http://vectordb:8003";
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
pub const DEFAULT_GENERATION_MODEL: &str = "llama3";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

fn env_or(key: &str, default: &str) -> String {
    dotenvy::dotenv().ok();
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_url(key: &str, default: &str) -> Result<Url, PipelineError> {
    let raw = env_or(key, default);
    Url::parse(&raw).map_err(|err| PipelineError::Config(format!("{key}={raw}: {err}")))
}

fn data_dir() -> PathBuf {
    PathBuf::from(env_or("RAGLINE_DATA_DIR", "data"))
}

/// Settings for the ingestion service.
#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub bind_addr: String,
    pub embedding_url: Url,
    pub vectordb_url: Url,
    pub documents_db: PathBuf,
    pub chunk_max_size: usize,
    pub chunk_overlap: usize,
    pub retry: RetryPolicy,
}

impl IngestionConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            bind_addr: env_or("INGESTION_BIND_ADDR", "0.0.0.0:8001"),
            embedding_url: env_url("EMBEDDING_SERVICE_URL", DEFAULT_EMBEDDING_URL)?,
            vectordb_url: env_url("VECTORDB_SERVICE_URL", DEFAULT_VECTORDB_URL)?,
            documents_db: data_dir().join("documents.db"),
            chunk_max_size: crate::chunker::DEFAULT_MAX_SIZE,
            chunk_overlap: crate::chunker::DEFAULT_OVERLAP,
            retry: RetryPolicy::default(),
        })
    }
}

/// Settings for the embedding service.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub bind_addr: String,
    pub vectordb_url: Url,
    pub ollama_url: Url,
    pub model: String,
    pub dimension: usize,
}

impl EmbeddingConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        let dimension = env_or(
            "EMBEDDING_DIMENSION",
            &DEFAULT_EMBEDDING_DIMENSION.to_string(),
        );
        Ok(Self {
            bind_addr: env_or("EMBEDDING_BIND_ADDR", "0.0.0.0:8002"),
            vectordb_url: env_url("VECTORDB_SERVICE_URL", DEFAULT_VECTORDB_URL)?,
            ollama_url: env_url("OLLAMA_BASE_URL", DEFAULT_OLLAMA_URL)?,
            model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            dimension: dimension.parse().map_err(|_| {
                PipelineError::Config(format!("EMBEDDING_DIMENSION={dimension} is not a number"))
            })?,
        })
    }
}

/// Settings for the vectordb service.
#[derive(Clone, Debug)]
pub struct VectorDbConfig {
    pub bind_addr: String,
    pub vectors_db: PathBuf,
}

impl VectorDbConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            bind_addr: env_or("VECTORDB_BIND_ADDR", "0.0.0.0:8003"),
            vectors_db: data_dir().join("vectors.db"),
        })
    }
}

/// Settings for the query service.
#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub bind_addr: String,
    pub embedding_url: Url,
    pub vectordb_url: Url,
    pub ollama_url: Url,
    pub model: String,
}

impl QueryConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            bind_addr: env_or("QUERY_BIND_ADDR", "0.0.0.0:8004"),
            embedding_url: env_url("EMBEDDING_SERVICE_URL", DEFAULT_EMBEDDING_URL)?,
            vectordb_url: env_url("VECTORDB_SERVICE_URL", DEFAULT_VECTORDB_URL)?,
            ollama_url: env_url("OLLAMA_BASE_URL", DEFAULT_OLLAMA_URL)?,
            model: env_or("OLLAMA_MODEL", DEFAULT_GENERATION_MODEL),
        })
    }
}

/// Retry knobs for the ingestion store pipeline. A small, explicit loop:
/// `max_attempts` tries with a fixed `delay` sleep between them.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}
