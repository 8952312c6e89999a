//! Batch processing for one record type.
//!
//! A batch runs select → text → embed → normalize → persist, then the
//! type's bookkeeping. Ids are processed in small concurrent chunks with a
//! pause between chunks. A failing record is logged and skipped; only a
//! failed selection aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use contrail_core::{EMBEDDING_DIMENSION, EmbeddingVector, RecordType, Result};
use contrail_store::DomainStore;
use contrail_vector::EmbeddingClient;
use futures::future::join_all;

use crate::handlers::{TypeHandler, handler_for};
use crate::sink::{EmbeddedRecord, EmbeddingSink};

/// Records in flight at once within a type.
pub const DEFAULT_CHUNK_SIZE: usize = 2;

/// Pause between consecutive chunks.
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_secs(1);

/// Tunables for [`BatchProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Records processed concurrently.
    pub chunk_size: usize,
    /// Delay between chunks.
    pub chunk_pause: Duration,
    /// Persisted vector length.
    pub dimension: usize,
    /// Skip persistence and bookkeeping.
    pub dry_run: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_pause: DEFAULT_CHUNK_PAUSE,
            dimension: EMBEDDING_DIMENSION,
            dry_run: false,
        }
    }
}

/// Drives one type's batch through the pipeline.
pub struct BatchProcessor {
    store: Arc<dyn DomainStore>,
    client: EmbeddingClient,
    sink: Arc<dyn EmbeddingSink>,
    settings: BatchSettings,
}

impl BatchProcessor {
    /// Create a processor.
    pub fn new(
        store: Arc<dyn DomainStore>,
        client: EmbeddingClient,
        sink: Arc<dyn EmbeddingSink>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            store,
            client,
            sink,
            settings,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Shared domain store.
    pub fn store(&self) -> &Arc<dyn DomainStore> {
        &self.store
    }

    /// Process up to `batch_size` pending records of `record_type`.
    ///
    /// Returns how many records were embedded and persisted. Errors only
    /// when the type's pending records cannot be selected.
    pub async fn process_batch(&self, record_type: RecordType, batch_size: usize) -> Result<usize> {
        let handler = handler_for(record_type);
        let ids = handler.select_batch(self.store.as_ref(), batch_size).await?;
        if ids.is_empty() {
            tracing::debug!(record_type = record_type.as_str(), "nothing to embed");
            return Ok(0);
        }
        tracing::info!(
            record_type = record_type.as_str(),
            selected = ids.len(),
            "processing batch"
        );

        let mut succeeded = Vec::with_capacity(ids.len());
        for (index, chunk) in ids.chunks(self.settings.chunk_size.max(1)).enumerate() {
            if index > 0 && !self.settings.chunk_pause.is_zero() {
                tokio::time::sleep(self.settings.chunk_pause).await;
            }
            let outcomes = join_all(chunk.iter().map(|id| self.process_record(handler, id))).await;
            for (id, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => succeeded.push(id.as_str()),
                    Err(e) => tracing::error!(
                        record_type = record_type.as_str(),
                        id = %id,
                        error = %e,
                        "failed to embed record"
                    ),
                }
            }
        }

        if !self.settings.dry_run {
            for id in &succeeded {
                if let Err(e) = handler.after_embed(self.store.as_ref(), id).await {
                    tracing::warn!(
                        record_type = record_type.as_str(),
                        id = %id,
                        error = %e,
                        "bookkeeping failed"
                    );
                }
            }
        }

        tracing::info!(
            record_type = record_type.as_str(),
            processed = succeeded.len(),
            failed = ids.len() - succeeded.len(),
            "batch complete"
        );
        Ok(succeeded.len())
    }

    async fn process_record(&self, handler: &dyn TypeHandler, id: &str) -> Result<()> {
        let record_type = handler.config().record_type;
        let rendered = handler.render(self.store.as_ref(), id).await?;
        let raw = self.client.embed(&rendered.text).await?;
        let vector = EmbeddingVector::from_raw(raw, self.settings.dimension);

        if self.settings.dry_run {
            tracing::debug!(
                record_type = record_type.as_str(),
                id,
                strategy = rendered.strategy,
                chars = rendered.text.len(),
                "dry run, skipping persistence"
            );
            return Ok(());
        }

        self.sink
            .persist(&EmbeddedRecord {
                record_type,
                id: rendered.id,
                text: rendered.text,
                source: rendered.source,
                vector,
            })
            .await?;
        tracing::debug!(
            record_type = record_type.as_str(),
            id,
            sink = self.sink.name(),
            "persisted"
        );
        Ok(())
    }
}
