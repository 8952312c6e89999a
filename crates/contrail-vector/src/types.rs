//! Common types for vector persistence.

use contrail_core::{EmbeddingVector, RecordType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Points
// ============================================================================

/// A record's vector plus the context stored next to it in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Record identity within its type.
    pub record_id: String,

    /// Record type tag.
    pub record_type: RecordType,

    /// Normalized embedding.
    pub vector: EmbeddingVector,

    /// Source row as read from the domain store.
    pub source: serde_json::Value,

    /// Text that was embedded.
    pub text: String,
}

impl VectorPoint {
    /// Create a new point.
    pub fn new(
        record_type: RecordType,
        record_id: impl Into<String>,
        vector: EmbeddingVector,
        text: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            record_type,
            vector,
            source: serde_json::Value::Null,
            text: text.into(),
        }
    }

    /// Attach the source row.
    pub fn with_source(mut self, source: serde_json::Value) -> Self {
        self.source = source;
        self
    }

    /// Stable point id derived from type and record id.
    ///
    /// Re-embedding a record produces the same id, so upserts overwrite.
    pub fn point_id(&self) -> Uuid {
        let name = format!("contrail:{}:{}", self.record_type.as_str(), self.record_id);
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    }

    /// Payload stored next to the vector.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "record_type": self.record_type,
            "record_id": self.record_id,
            "text": self.text,
            "source": self.source,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
