//! Per-pass results.

use std::fmt;

use crate::record::RecordType;

/// Outcome of one record type within a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Record type processed.
    pub record_type: RecordType,
    /// Records whose embedding and persistence both succeeded.
    pub processed: usize,
    /// Type-level failure that aborted this type's pass, if any.
    pub error: Option<String>,
}

impl RunResult {
    /// A completed type pass.
    pub fn processed(record_type: RecordType, processed: usize) -> Self {
        Self {
            record_type,
            processed,
            error: None,
        }
    }

    /// A type pass aborted by a type-level error.
    pub fn failed(record_type: RecordType, error: impl Into<String>) -> Self {
        Self {
            record_type,
            processed: 0,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one pass across all configured types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Per-type results in processing order.
    pub results: Vec<RunResult>,
    /// Rows moved to archived status during housekeeping.
    pub archived: usize,
}

impl PassSummary {
    /// Records processed across all types.
    pub fn total_processed(&self) -> usize {
        self.results.iter().map(|r| r.processed).sum()
    }

    /// Number of types whose pass was aborted.
    pub fn failed_types(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    /// Processed count for one type, if it ran.
    pub fn processed_for(&self, record_type: RecordType) -> Option<usize> {
        self.results
            .iter()
            .find(|r| r.record_type == record_type)
            .map(|r| r.processed)
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            match &result.error {
                Some(err) => writeln!(f, "  {:<12} failed: {}", result.record_type, err)?,
                None => writeln!(f, "  {:<12} {}", result.record_type, result.processed)?,
            }
        }
        write!(
            f,
            "  {:<12} {} (archived {})",
            "total",
            self.total_processed(),
            self.archived
        )
    }
}
