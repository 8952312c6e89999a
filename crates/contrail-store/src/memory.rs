//! In-memory domain store.
//!
//! Holds tables as vectors of JSON rows. Pending functions can be registered
//! per table, failures can be injected per table, per key, or per column, and
//! every call is logged so tests can assert which queries a pass issued.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use contrail_core::{Error, Result, Row};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::traits::{DomainStore, Filter, RowQuery, key_of};

/// Argument name carrying the row limit to pending functions.
pub const LIMIT_ARG: &str = "batch_limit";

/// A call observed by the [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `select` against a table.
    Select {
        /// Table queried.
        table: String,
        /// Predicates used.
        filters: Vec<Filter>,
    },
    /// `call_function`.
    Function {
        /// Function name.
        name: String,
    },
    /// `update` against a table.
    Update {
        /// Table updated.
        table: String,
        /// Columns written.
        columns: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct PendingFunction {
    table: String,
    vector_column: String,
}

/// Domain store backed by in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    functions: HashMap<String, PendingFunction>,
    failing_tables: HashSet<String>,
    failing_keys: HashSet<(String, String)>,
    missing_columns: HashSet<(String, String)>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `table` with rows.
    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables
            .get_mut()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Register a pending function returning rows of `table` whose
    /// `vector_column` is null.
    pub fn with_pending_function(mut self, name: &str, table: &str, vector_column: &str) -> Self {
        self.functions.insert(
            name.to_string(),
            PendingFunction {
                table: table.to_string(),
                vector_column: vector_column.to_string(),
            },
        );
        self
    }

    /// Make every select and function call touching `table` fail.
    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Make key lookups of `key` in `table` fail.
    pub fn with_failing_key(mut self, table: &str, key: &str) -> Self {
        self.failing_keys.insert((table.to_string(), key.to_string()));
        self
    }

    /// Report `column` as absent from `table` on writes.
    pub fn with_missing_column(mut self, table: &str, column: &str) -> Self {
        self.missing_columns
            .insert((table.to_string(), column.to_string()));
        self
    }

    /// Snapshot of a table's rows.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Find a row by key.
    pub async fn row(&self, table: &str, key_column: &str, key: &str) -> Option<Row> {
        self.rows(table)
            .await
            .into_iter()
            .find(|row| key_of(row, key_column).as_deref() == Some(key))
    }

    /// Every call observed so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Forget the call log.
    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }

    fn check_table(&self, table: &str) -> Result<()> {
        if self.failing_tables.contains(table) {
            return Err(Error::store(format!("{table}: connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Row>> {
        self.record(StoreCall::Select {
            table: table.to_string(),
            filters: query.filters.clone(),
        })
        .await;
        self.check_table(table)?;

        for filter in &query.filters {
            if let Filter::Eq(_, Value::String(key)) = filter {
                if self
                    .failing_keys
                    .contains(&(table.to_string(), key.clone()))
                {
                    return Err(Error::store(format!("{table}/{key}: lookup failed")));
                }
            }
        }

        let tables = self.tables.read().await;
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
            .take(limit)
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn call_function(&self, function: &str, args: &Row) -> Result<Vec<Row>> {
        self.record(StoreCall::Function {
            name: function.to_string(),
        })
        .await;

        let pending = self
            .functions
            .get(function)
            .ok_or_else(|| Error::unavailable(format!("function {function} does not exist")))?;
        self.check_table(&pending.table)?;

        let limit = args
            .get(LIMIT_ARG)
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(usize::MAX);
        let tables = self.tables.read().await;
        let rows = tables
            .get(&pending.table)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let filter = Filter::is_null(pending.vector_column.as_str());
        Ok(rows
            .iter()
            .filter(|row| matches_filter(row, &filter))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<usize> {
        self.record(StoreCall::Update {
            table: table.to_string(),
            columns: patch.keys().cloned().collect(),
        })
        .await;

        if let Some(column) = patch
            .keys()
            .find(|c| self.missing_columns.contains(&(table.to_string(), (*c).clone())))
        {
            return Err(Error::missing_column(table, column.clone()));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = 0;
        for row in rows
            .iter_mut()
            .filter(|row| filters.iter().all(|f| matches_filter(row, f)))
        {
            for (column, value) in patch {
                row.insert(column.clone(), value.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, expected) => row
            .get(column)
            .is_some_and(|value| loosely_equal(value, expected)),
        Filter::IsNull(column) => row.get(column).is_none_or(Value::is_null),
        Filter::Lt(column, bound) => row
            .get(column)
            .and_then(|value| compare(value, bound))
            .is_some_and(|ord| ord == Ordering::Less),
    }
}

fn loosely_equal(value: &Value, expected: &Value) -> bool {
    match (value, expected) {
        (Value::Number(_), Value::String(s)) => value.to_string() == *s,
        _ => value == expected,
    }
}

fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        // ISO-8601 dates and timestamps order lexicographically.
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn project(row: &Row, columns: Option<&[String]>) -> Row {
    match columns {
        None => row.clone(),
        Some(columns) if columns.iter().any(|c| c == "*") => row.clone(),
        Some(columns) => columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect(),
    }
}
