//! Error taxonomy shared across the pipeline services.

use thiserror::Error;

/// Errors surfaced by the ingestion and query pipelines and their
/// supporting stores and clients.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded file has an extension no extractor is registered for.
    /// Reported immediately to the caller; never retried.
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    /// Text extraction from the uploaded bytes failed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// A downstream service could not be reached or answered with a
    /// non-success status. This is the only retryable class of failure.
    #[error("{service} service unavailable: {message}")]
    Downstream {
        service: &'static str,
        message: String,
    },

    /// Local persistence (document records or vector records) failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The embedding backend rejected or failed the request.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The generation backend rejected or failed the request.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A request payload violated an interface contract (for example a
    /// chunk/embedding length mismatch on store).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Service configuration could not be resolved.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Returns `true` for failures the ingestion retry loop may attempt
    /// again: network-level failures and non-success downstream responses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Downstream { .. })
    }

    /// Convenience constructor for downstream failures.
    pub fn downstream(service: &'static str, message: impl Into<String>) -> Self {
        PipelineError::Downstream {
            service,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_downstream_errors_are_retryable() {
        assert!(PipelineError::downstream("embedding", "connection refused").is_retryable());
        assert!(!PipelineError::UnsupportedFile("exe".into()).is_retryable());
        assert!(!PipelineError::Storage("disk full".into()).is_retryable());
        assert!(!PipelineError::Generation("model missing".into()).is_retryable());
    }
}
