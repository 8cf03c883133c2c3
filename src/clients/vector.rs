//! HTTP client for the vectordb service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::PipelineError;
use crate::types::{ScoredChunk, SearchRequest, StoreRequest};

use super::VectorIndex;

const SERVICE: &str = "vectordb";

/// Calls `POST /store`, `POST /search`, and `DELETE /documents/{id}` on
/// the vectordb service.
#[derive(Clone)]
pub struct HttpVectorIndexClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct StoreResponse {
    count: usize,
}

impl HttpVectorIndexClient {
    pub fn new(base_url: Url) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PipelineError> {
        self.base_url
            .join(path)
            .map_err(|err| PipelineError::Config(err.to_string()))
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndexClient {
    async fn store(
        &self,
        doc_id: i64,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, PipelineError> {
        let response = self
            .client
            .post(self.endpoint("store")?)
            .json(&StoreRequest {
                doc_id,
                chunks: chunks.to_vec(),
                embeddings: embeddings.to_vec(),
            })
            .send()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::downstream(
                SERVICE,
                format!("store returned {}", response.status()),
            ));
        }

        let parsed: StoreResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;
        Ok(parsed.count)
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let response = self
            .client
            .post(self.endpoint("search")?)
            .timeout(Duration::from_secs(30))
            .json(&SearchRequest {
                embedding: embedding.to_vec(),
                top_k,
            })
            .send()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::downstream(
                SERVICE,
                format!("search returned {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))
    }

    async fn delete_document(&self, doc_id: i64) -> Result<(), PipelineError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("documents/{doc_id}"))?)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::downstream(
                SERVICE,
                format!("delete returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
