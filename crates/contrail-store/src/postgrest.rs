//! PostgREST (Supabase REST) domain store.
//!
//! Translates [`DomainStore`] calls into the PostgREST HTTP dialect:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `select` | `GET /rest/v1/<table>?select=..&col=eq.v&limit=n` |
//! | `call_function` | `POST /rest/v1/rpc/<function>` |
//! | `update` | `PATCH /rest/v1/<table>?col=eq.v` |
//!
//! Error bodies carry a PostgREST or Postgres error code which is mapped to
//! the typed store errors the pipeline's fallbacks depend on.

use std::time::Duration;

use async_trait::async_trait;
use contrail_core::{Error, Result, Row};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::retry::RetryPolicy;
use crate::traits::{DomainStore, Filter, RowQuery};

/// Domain store backed by a PostgREST endpoint.
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl PostgrestStore {
    /// Build a store client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`
    /// * `api_key` - Service key sent as `apikey` and bearer token
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::config("missing store API key"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::config("store URL must be an http(s) URL"));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| Error::config("invalid store API key"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| Error::config("invalid store API key"))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build store HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy for transient failures.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        table: &str,
    ) -> Result<Vec<Row>> {
        self.retry
            .run(|| self.send(method.clone(), path, params, body, table))
            .await
    }

    /// One HTTP round trip, no retries.
    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        table: &str,
    ) -> Result<Vec<Row>> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url).query(params);
        if method == Method::PATCH {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                Error::store_transient(format!("{path}: {e}"))
            } else {
                Error::store(format!("{path}: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(map_error(status, &body, path, table));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::store(format!("{path}: invalid response body: {e}")))?;
        Ok(rows_from(payload))
    }
}

#[async_trait]
impl DomainStore for PostgrestStore {
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Row>> {
        let mut params = Vec::new();
        let columns = query
            .columns
            .as_ref()
            .map(|c| c.join(","))
            .unwrap_or_else(|| "*".to_string());
        params.push(("select".to_string(), columns));
        params.extend(filter_params(&query.filters));
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        self.request(Method::GET, table, &params, None, table).await
    }

    async fn call_function(&self, function: &str, args: &Row) -> Result<Vec<Row>> {
        let body = Value::Object(args.clone());
        let path = format!("rpc/{function}");
        self.request(Method::POST, &path, &[], Some(&body), function)
            .await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<usize> {
        if filters.is_empty() {
            return Err(Error::invalid_data(format!(
                "refusing unfiltered update of {table}"
            )));
        }
        let body = Value::Object(patch.clone());
        // Updates are sent once.
        let rows = self
            .send(Method::PATCH, table, &filter_params(filters), Some(&body), table)
            .await?;
        Ok(rows.len())
    }

    fn name(&self) -> &str {
        "postgrest"
    }
}

/// PostgREST error payload.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn map_error(status: StatusCode, body: &str, path: &str, table: &str) -> Error {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.as_deref().unwrap_or_default();
    let message = parsed.message.as_deref().unwrap_or(body);

    match code {
        // Function not found in the schema cache.
        "PGRST202" | "42883" => Error::unavailable(format!("{path}: {message}")),
        // Column not found in the schema cache / undefined column.
        "PGRST204" | "42703" => {
            let column = quoted_name(message).unwrap_or_else(|| "unknown".to_string());
            Error::missing_column(table, column)
        }
        _ if status == StatusCode::NOT_FOUND && path.starts_with("rpc/") => {
            Error::unavailable(format!("{path}: {message}"))
        }
        _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            Error::store_transient(format!("{path} ({status}): {message}"))
        }
        _ => Error::store(format!("{path} ({status}): {message}")),
    }
}

/// First single-quoted name in a PostgREST message, e.g.
/// `Could not find the 'embedded_at' column of 'offers' in the schema cache`.
fn quoted_name(message: &str) -> Option<String> {
    let start = message.find('\'')? + 1;
    let len = message[start..].find('\'')?;
    Some(message[start..start + len].to_string())
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", render(value))),
            Filter::IsNull(column) => (column.clone(), "is.null".to_string()),
            Filter::Lt(column, value) => (column.clone(), format!("lt.{}", render(value))),
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rows_from(payload: Value) -> Vec<Row> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        Value::Object(row) => vec![row],
        _ => Vec::new(),
    }
}
