//! Pass orchestration.
//!
//! One pass runs housekeeping, then every selected record type in ascending
//! priority. Types run strictly one after another, and a type that fails to
//! select does not stop the types after it.

use chrono::Utc;
use contrail_core::{PassSummary, RunResult, TypeSelection};

use crate::batch::BatchProcessor;
use crate::housekeeping::Archiver;

/// Default records selected per type per pass.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Runs passes over the configured record types.
pub struct Orchestrator {
    processor: BatchProcessor,
    archiver: Archiver,
    selection: TypeSelection,
    batch_size: usize,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(
        processor: BatchProcessor,
        archiver: Archiver,
        selection: TypeSelection,
        batch_size: usize,
    ) -> Self {
        Self {
            processor,
            archiver,
            selection,
            batch_size,
        }
    }

    /// Types covered by each pass.
    pub fn selection(&self) -> TypeSelection {
        self.selection
    }

    /// Run one pass and log its summary.
    pub async fn run_pass(&self) -> PassSummary {
        let archived = self.archiver.run(Utc::now()).await;

        let mut results = Vec::new();
        for record_type in self.selection.types() {
            let result = match self
                .processor
                .process_batch(record_type, self.batch_size)
                .await
            {
                Ok(processed) => RunResult::processed(record_type, processed),
                Err(e) => {
                    tracing::error!(
                        record_type = record_type.as_str(),
                        error = %e,
                        "record type aborted"
                    );
                    RunResult::failed(record_type, e.to_string())
                }
            };
            results.push(result);
        }

        let summary = PassSummary { results, archived };
        tracing::info!(
            processed = summary.total_processed(),
            failed_types = summary.failed_types(),
            "pass complete\n{summary}"
        );
        summary
    }
}
