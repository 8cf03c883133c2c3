//! HTTP client for the embedding service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::PipelineError;
use crate::types::{EmbedBatchRequest, EmbedRequest, EmbedResponse};

use super::EmbeddingStage;

const SERVICE: &str = "embedding";

/// Calls `POST /embed` and `POST /embed-batch` on the embedding service.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct EmbedBatchResponse {
    chunks: usize,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: Url) -> Result<Self, PipelineError> {
        // Batch embedding of a large document can be slow; the single-text
        // path gets a tighter per-request timeout below.
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
impl EmbeddingStage for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let response = self
            .client
            .post(self.endpoint("embed")?)
            .timeout(Duration::from_secs(30))
            .json(&EmbedRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::downstream(
                SERVICE,
                format!("embed returned {}", response.status()),
            ));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;
        Ok(parsed.embedding)
    }

    async fn embed_and_store(
        &self,
        doc_id: i64,
        chunks: &[String],
    ) -> Result<usize, PipelineError> {
        let response = self
            .client
            .post(self.endpoint("embed-batch")?)
            .json(&EmbedBatchRequest {
                doc_id,
                chunks: chunks.to_vec(),
            })
            .send()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::downstream(
                SERVICE,
                format!("embed-batch returned {}", response.status()),
            ));
        }

        let parsed: EmbedBatchResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::downstream(SERVICE, err.to_string()))?;
        Ok(parsed.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> HttpEmbeddingClient {
        HttpEmbeddingClient::new(Url::parse(&server.base_url()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn embed_posts_text_and_parses_vector() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embed")
                    .json_body(serde_json::json!({"text": "what is rust?"}));
                then.status(200)
                    .json_body(serde_json::json!({"embedding": [0.25, -0.5]}));
            })
            .await;

        let client = client_for(&server);
        let vector = client.embed("what is rust?").await.unwrap();
        assert_eq!(vector, vec![0.25, -0.5]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn embed_batch_reports_processed_chunk_count() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed-batch").json_body(
                    serde_json::json!({"doc_id": 3, "chunks": ["first", "second"]}),
                );
                then.status(200).json_body(
                    serde_json::json!({"message": "Embeddings generated and stored", "chunks": 2}),
                );
            })
            .await;

        let client = client_for(&server);
        let stored = client
            .embed_and_store(3, &["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_retryable_downstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed-batch");
                then.status(503);
            })
            .await;

        let client = client_for(&server);
        let err = client
            .embed_and_store(1, &["chunk".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "got {err}");
    }
}
