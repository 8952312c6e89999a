//! Vector store trait and in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use contrail_core::{RecordType, Result};
use tokio::sync::RwLock;

use crate::types::VectorPoint;

/// Idempotent destination for embedded records.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite the point for `(record_type, record_id)`.
    async fn upsert(&self, point: &VectorPoint) -> Result<()>;

    /// The store name for diagnostics.
    fn name(&self) -> &str;
}

/// In-memory vector store keyed by `(record_type, record_id)`.
#[derive(Default)]
pub struct MemoryVectorStore {
    points: RwLock<HashMap<(RecordType, String), VectorPoint>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored point.
    pub async fn get(&self, record_type: RecordType, record_id: &str) -> Option<VectorPoint> {
        self.points
            .read()
            .await
            .get(&(record_type, record_id.to_string()))
            .cloned()
    }

    /// Number of stored points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    /// Whether the store holds no points.
    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, point: &VectorPoint) -> Result<()> {
        self.points.write().await.insert(
            (point.record_type, point.record_id.clone()),
            point.clone(),
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
