//! Qdrant vector store.
//!
//! Upserts points through the REST API:
//! `PUT /collections/<collection>/points?wait=true`.

use std::time::Duration;

use async_trait::async_trait;
use contrail_core::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::json;

use crate::store::VectorStore;
use crate::types::VectorPoint;

/// Vector store backed by a Qdrant collection.
pub struct QdrantVectorStore {
    client: reqwest::Client,
    endpoint: String,
}

impl QdrantVectorStore {
    /// Builds a new Qdrant client.
    ///
    /// # Arguments
    /// * `url` - Cluster URL, e.g. `https://cluster-id.cloud.qdrant.io:6333`
    /// * `api_key` - Value for the `api-key` header; empty for local clusters
    /// * `collection` - Target collection
    /// * `timeout` - Per-request timeout
    pub fn new(url: &str, api_key: &str, collection: &str, timeout: Duration) -> Result<Self> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config("Qdrant URL must be an http(s) URL"));
        }
        if collection.trim().is_empty() {
            return Err(Error::config("missing Qdrant collection name"));
        }

        let mut headers = HeaderMap::new();
        if !api_key.trim().is_empty() {
            headers.insert(
                "api-key",
                HeaderValue::from_str(api_key.trim())
                    .map_err(|_| Error::config("invalid Qdrant API key"))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build Qdrant HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/collections/{}/points",
                url.trim_end_matches('/'),
                collection.trim()
            ),
        })
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, point: &VectorPoint) -> Result<()> {
        let body = json!({
            "points": [{
                "id": point.point_id().to_string(),
                "vector": point.vector.as_slice(),
                "payload": point.payload(),
            }]
        });

        let response = self
            .client
            .put(&self.endpoint)
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("upsert request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::vector_store(format!(
                "Qdrant upsert failed ({status}): {body}"
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use contrail_core::{EmbeddingVector, RecordType};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn sample_point() -> VectorPoint {
        VectorPoint::new(
            RecordType::Offer,
            "o1",
            EmbeddingVector::from_raw(vec![0.25, 0.5], 3),
            "Offer o1",
        )
        .with_source(json!({"id": "o1"}))
    }

    #[test]
    fn test_new_validates_inputs() {
        assert!(QdrantVectorStore::new("localhost:6333", "", "c", Duration::from_secs(1)).is_err());
        assert!(
            QdrantVectorStore::new("http://localhost:6333", "", " ", Duration::from_secs(1))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_upsert_sends_point() {
        let server = MockServer::start().await;
        let expected_id = sample_point().point_id().to_string();
        Mock::given(method("PUT"))
            .and(path("/collections/marketplace/points"))
            .and(query_param("wait", "true"))
            .and(header("api-key", "qk"))
            .and(move |req: &Request| {
                let body: serde_json::Value = match serde_json::from_slice(&req.body) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                let point = &body["points"][0];
                point["id"] == expected_id.as_str()
                    && point["vector"].as_array().map(Vec::len) == Some(3)
                    && point["payload"]["record_type"] == "offer"
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let store =
            QdrantVectorStore::new(&server.uri(), "qk", "marketplace", Duration::from_secs(5))
                .unwrap();
        store.upsert(&sample_point()).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(400).set_body_string("wrong dimension"))
            .mount(&server)
            .await;

        let store =
            QdrantVectorStore::new(&server.uri(), "", "marketplace", Duration::from_secs(5))
                .unwrap();
        let err = store.upsert(&sample_point()).await.unwrap_err();
        assert!(err.to_string().contains("wrong dimension"));
    }
}
