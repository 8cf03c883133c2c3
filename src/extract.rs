//! Text extraction boundary: uploaded bytes in, plain text out.
//!
//! File-format parsing is an external capability. Extractors are selected
//! by file extension through a registry; deployments register additional
//! formats (PDF, DOCX) next to the built-in plain-text extractor.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::PipelineError;

/// One file-format-specific extraction capability.
pub trait TextExtractor: Send + Sync {
    /// Converts raw uploaded bytes into plain text.
    fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError>;
}

/// Strict UTF-8 extractor for `.txt` uploads.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|err| PipelineError::Extraction(format!("invalid utf-8 text file: {err}")))
    }
}

/// Maps lowercase file extensions to extractors.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in plain-text extractor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("txt", Arc::new(PlainTextExtractor));
        registry
    }

    /// Registers an extractor for a file extension (without the dot).
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        self.extractors
            .insert(extension.to_ascii_lowercase(), extractor);
    }

    /// Extracts text from `bytes` using the extractor registered for the
    /// filename's extension. Unknown extensions are a client error and are
    /// never retried.
    pub fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, PipelineError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let extractor = self
            .extractors
            .get(&extension)
            .ok_or_else(|| PipelineError::UnsupportedFile(filename.to_string()))?;

        extractor.extract(bytes)
    }
}
