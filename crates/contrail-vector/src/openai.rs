//! OpenAI-compatible embedding provider.

use std::time::Duration;

use async_trait::async_trait;
use contrail_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;

/// Embedding provider talking to an OpenAI-compatible `/embeddings` endpoint.
///
/// Sends one input per request and never retries; rate limiting and the
/// decision to try again on a later pass belong to the caller.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiProvider {
    /// Creates a new OpenAI provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key sent as a bearer token
    /// * `base_url` - API base, e.g. `https://api.openai.com/v1`
    /// * `model` - Model ID (e.g., "text-embedding-3-small")
    /// * `dimensions` - Optional width override for models that support it
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self> {
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("missing embedding API key"));
        }
        if model.trim().is_empty() {
            return Err(Error::config("missing embedding model name"));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| Error::config("invalid embedding API key"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build embedding HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::provider_transient(format!("embedding request failed: {e}"))
                } else {
                    Error::provider(format!("embedding request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let message = format!("embedding API error {status}: {body}");
            return Err(if should_retry(status) {
                Error::provider_transient(message)
            } else {
                Error::provider(message)
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("failed to parse embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| Error::provider("embedding response contained no vectors"))
    }

    fn dimension(&self) -> Option<usize> {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
