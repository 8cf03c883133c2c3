//! HTTP client for the Ollama generation backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PipelineError;

use super::Generation;

/// Generation can be very slow on cold models; this bounds one call.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(1200);

/// Calls `POST /api/generate` on an Ollama-compatible backend.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &Url, model: &str) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        let endpoint = base_url
            .join("api/generate")
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Generation for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|err| PipelineError::Generation(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Generation(format!(
                "generation backend returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Generation(err.to_string()))?;
        Ok(parsed.response)
    }
}
