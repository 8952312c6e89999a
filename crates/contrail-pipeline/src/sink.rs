//! Persistence targets for embedded records.
//!
//! Two targets are available and interchangeable:
//!
//! - [`DomainColumnSink`] writes the vector back onto the record's row,
//!   together with an `embedded_at` timestamp when the type has one
//! - [`VectorStoreSink`] upserts a point into an external vector index

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use contrail_core::{EmbeddingVector, Error, RecordType, Result, Row};
use contrail_store::{DomainStore, Filter};
use contrail_vector::{VectorPoint, VectorStore};
use serde_json::Value;

use crate::fallback::Fallback;

/// A record ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedRecord {
    /// Record type.
    pub record_type: RecordType,
    /// Record key.
    pub id: String,
    /// Text that was embedded.
    pub text: String,
    /// The record's own row.
    pub source: Row,
    /// Normalized vector.
    pub vector: EmbeddingVector,
}

/// Where embedded records end up.
#[async_trait]
pub trait EmbeddingSink: Send + Sync {
    /// Persist one record's vector.
    async fn persist(&self, record: &EmbeddedRecord) -> Result<()>;

    /// Sink name for logs.
    fn name(&self) -> &str;
}

// ============================================================================
// Domain columns
// ============================================================================

/// Writes vectors onto the domain rows themselves.
pub struct DomainColumnSink {
    store: Arc<dyn DomainStore>,
}

impl DomainColumnSink {
    /// Create a sink writing through `store`.
    pub fn new(store: Arc<dyn DomainStore>) -> Self {
        Self { store }
    }

    async fn write(
        &self,
        record: &EmbeddedRecord,
        embedded_at: Option<(&str, DateTime<Utc>)>,
    ) -> Result<()> {
        let config = record.record_type.config();
        let mut patch = Row::new();
        patch.insert(
            config.vector_column.to_string(),
            Value::String(record.vector.to_pgvector()),
        );
        if let Some((column, at)) = embedded_at {
            patch.insert(
                column.to_string(),
                Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        let updated = self
            .store
            .update(
                config.table,
                &[Filter::eq(config.key_column, record.id.as_str())],
                &patch,
            )
            .await?;
        if updated == 0 {
            return Err(Error::not_found(format!("{} {}", config.table, record.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingSink for DomainColumnSink {
    async fn persist(&self, record: &EmbeddedRecord) -> Result<()> {
        let Some(column) = record.record_type.config().embedded_at_column else {
            return self.write(record, None).await;
        };

        let now = Utc::now();
        let outcome = Fallback::new("persist")
            .then("with_timestamp", move || self.write(record, Some((column, now))))
            .then("without_timestamp", move || self.write(record, None))
            .run()
            .await?;
        if outcome.strategy == "without_timestamp" {
            tracing::debug!(
                record_type = record.record_type.as_str(),
                id = %record.id,
                column,
                "persisted without timestamp"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "domain"
    }
}

// ============================================================================
// Vector store
// ============================================================================

/// Upserts points into an external vector index.
pub struct VectorStoreSink {
    store: Arc<dyn VectorStore>,
}

impl VectorStoreSink {
    /// Create a sink writing to `store`.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EmbeddingSink for VectorStoreSink {
    async fn persist(&self, record: &EmbeddedRecord) -> Result<()> {
        let point = VectorPoint::new(
            record.record_type,
            record.id.as_str(),
            record.vector.clone(),
            record.text.as_str(),
        )
        .with_source(Value::Object(record.source.clone()));
        self.store.upsert(&point).await
    }

    fn name(&self) -> &str {
        "vector-store"
    }
}
