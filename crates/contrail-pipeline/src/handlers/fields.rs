//! Field rendering helpers shared by the type handlers.

use contrail_core::{Error, Result, Row};
use contrail_store::DomainStore;
use serde_json::Value;

/// Placeholder for absent fields.
pub const UNKNOWN: &str = "Unknown";

/// Render a scalar column, or `None` when absent or null.
pub fn opt(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            (!items.is_empty()).then(|| items.join(", "))
        }
        Value::Object(_) => None,
    }
}

/// Render a column, substituting [`UNKNOWN`].
pub fn text(row: &Row, column: &str) -> String {
    opt(row, column).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Render a column from an optional joined row.
pub fn joined(row: Option<&Row>, column: &str) -> String {
    row.map(|r| text(r, column))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Amount with its currency, e.g. `12500 USD`.
pub fn money(row: &Row, amount: &str, currency: &str) -> String {
    match (opt(row, amount), opt(row, currency)) {
        (Some(a), Some(c)) => format!("{a} {c}"),
        (Some(a), None) => a,
        _ => UNKNOWN.to_string(),
    }
}

/// Fetch the row a foreign key points to.
///
/// A null key yields `Ok(None)` and renders as [`UNKNOWN`]. A key that
/// points nowhere is an enrichment failure.
pub async fn related(
    store: &dyn DomainStore,
    row: &Row,
    foreign_key: &str,
    table: &str,
    key_column: &str,
) -> Result<Option<Row>> {
    let Some(key) = opt(row, foreign_key) else {
        return Ok(None);
    };
    store
        .fetch_one(table, key_column, &key)
        .await?
        .map(Some)
        .ok_or_else(|| Error::not_found(format!("{table} {key} referenced by {foreign_key}")))
}

/// Airport label: `KJFK (John F Kennedy Intl, New York)`.
pub fn airport_label(code: &str, airport: Option<&Row>) -> String {
    match airport {
        Some(a) => format!("{code} ({}, {})", text(a, "name"), text(a, "city")),
        None => code.to_string(),
    }
}

/// Aircraft label: `Gulfstream G650 (N650GA)`.
pub fn aircraft_label(aircraft: Option<&Row>) -> String {
    match aircraft {
        Some(a) => format!(
            "{} {} ({})",
            text(a, "manufacturer"),
            text(a, "model"),
            text(a, "registration")
        ),
        None => UNKNOWN.to_string(),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
