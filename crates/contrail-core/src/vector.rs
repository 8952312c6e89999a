//! Fixed-dimension embedding vectors.
//!
//! The embedding provider may answer with a width that differs from the
//! index dimension the stores were created with. [`normalize`] pads with
//! zeros or truncates so every persisted vector has exactly the expected
//! length. This is lossy and does no resampling.

use serde::{Deserialize, Serialize};

/// Canonical dimension of persisted vectors.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Pad (with zeros, on the right) or truncate `raw` to `expected` entries.
pub fn normalize(mut raw: Vec<f32>, expected: usize) -> Vec<f32> {
    if raw.len() != expected {
        tracing::debug!(
            raw = raw.len(),
            expected,
            "normalizing embedding dimension"
        );
        raw.resize(expected, 0.0);
    }
    raw
}

/// An embedding whose length equals the dimension it was normalized to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Normalize a raw provider vector to `dimension`.
    pub fn from_raw(raw: Vec<f32>, dimension: usize) -> Self {
        Self(normalize(raw, dimension))
    }

    /// The vector length.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Borrow the components.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Consume into the component vector.
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Render as a pgvector literal (`[0.1,0.2,...]`).
    pub fn to_pgvector(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }
}
