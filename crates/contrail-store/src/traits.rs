//! Domain store abstraction.
//!
//! The worker only needs a handful of row-level operations from the
//! relational store: filtered selects, calling a named store function, and
//! filtered updates. Rows travel as JSON objects so every record type can
//! share one interface.

use async_trait::async_trait;
use contrail_core::{Result, Row};
use serde_json::Value;

/// A single row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column IS NULL`
    IsNull(String),
    /// `column < value`
    Lt(String, Value),
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(column.into(), value.into())
    }

    /// The column this predicate constrains.
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::IsNull(c) | Self::Lt(c, _) => c,
        }
    }
}

/// Parameters of a filtered select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    /// Columns to return; `None` means all.
    pub columns: Option<Vec<String>>,
    /// Conjunction of predicates.
    pub filters: Vec<Filter>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
}

impl RowQuery {
    /// An unfiltered select of all columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a predicate.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Limit the number of rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row-level access to the relational domain store.
///
/// Implementations must be `Send + Sync`; the pipeline shares one store
/// across concurrently processed records.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Select rows from `table`.
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Row>>;

    /// Call a store-side function returning rows.
    ///
    /// Returns [`contrail_core::Error::Unavailable`] when the function does
    /// not exist.
    async fn call_function(&self, function: &str, args: &Row) -> Result<Vec<Row>>;

    /// Apply `patch` to every row of `table` matching `filters`; returns the
    /// number of rows updated.
    ///
    /// Returns [`contrail_core::Error::MissingColumn`] when the patch names a
    /// column the table does not have.
    async fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<usize>;

    /// Fetch a single row by key.
    async fn fetch_one(&self, table: &str, key_column: &str, key: &str) -> Result<Option<Row>> {
        let query = RowQuery::new().filter(Filter::eq(key_column, key)).limit(1);
        Ok(self.select(table, &query).await?.into_iter().next())
    }

    /// The store name for diagnostics.
    fn name(&self) -> &str;
}

/// Render a row's key column as a string id.
pub fn key_of(row: &Row, key_column: &str) -> Option<String> {
    match row.get(key_column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
