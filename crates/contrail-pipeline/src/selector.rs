//! Record selection.
//!
//! Finds ids of records lacking an embedding. The type's pending function
//! is preferred; when it is not deployed or fails, a plain
//! `<vector column> IS NULL` select takes over.

use contrail_core::{Error, Result, Row, TypeConfig};
use contrail_store::{DomainStore, Filter, LIMIT_ARG, RowQuery, key_of};
use serde_json::Value;

use crate::fallback::Fallback;

/// Ids of up to `limit` records of `config`'s type without an embedding.
pub async fn select_batch(
    store: &dyn DomainStore,
    config: &'static TypeConfig,
    limit: usize,
) -> Result<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut chain = Fallback::new("selector");
    if let Some(function) = config.pending_function {
        chain = chain.then("pending_function", move || {
            via_function(store, config, function, limit)
        });
    }
    let outcome = chain
        .then("null_filter", move || via_null_filter(store, config, limit))
        .run()
        .await?;

    tracing::debug!(
        record_type = config.record_type.as_str(),
        strategy = outcome.strategy,
        selected = outcome.value.len(),
        "selected batch"
    );
    Ok(outcome.value)
}

async fn via_function(
    store: &dyn DomainStore,
    config: &TypeConfig,
    function: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let mut args = Row::new();
    args.insert(LIMIT_ARG.to_string(), Value::from(limit));
    let rows = store.call_function(function, &args).await.inspect_err(|e| {
        if e.is_unavailable() {
            tracing::info!(function, "pending function unavailable, using null filter");
        } else {
            tracing::warn!(function, error = %e, "pending function failed, using null filter");
        }
    })?;
    ids(rows, config, limit)
}

async fn via_null_filter(
    store: &dyn DomainStore,
    config: &TypeConfig,
    limit: usize,
) -> Result<Vec<String>> {
    let query = RowQuery::new()
        .columns([config.key_column])
        .filter(Filter::is_null(config.vector_column))
        .limit(limit);
    let rows = store.select(config.table, &query).await?;
    ids(rows, config, limit)
}

fn ids(rows: Vec<Row>, config: &TypeConfig, limit: usize) -> Result<Vec<String>> {
    let ids: Vec<String> = rows
        .iter()
        .filter_map(|row| key_of(row, config.key_column))
        .take(limit)
        .collect();
    if ids.len() < rows.len().min(limit) {
        return Err(Error::invalid_data(format!(
            "{} rows without a usable {} key",
            config.table, config.key_column
        )));
    }
    Ok(ids)
}
