//! Application wiring.
//!
//! Turns the loaded configuration and CLI flags into a [`Scheduler`] over
//! concrete adapters and runs it.

use std::path::PathBuf;
use std::sync::Arc;

use contrail_core::{PassSummary, Result};
use contrail_pipeline::{
    Archiver, BatchProcessor, BatchSettings, DomainColumnSink, EmbeddingSink, Orchestrator,
    RunMode, Scheduler, VectorStoreSink,
};
use contrail_store::{DomainStore, PostgrestStore, RetryPolicy};
use contrail_vector::{
    EmbeddingClient, EmbeddingProvider, MockEmbeddingProvider, OpenAiProvider,
    QdrantVectorStore, RateLimiter,
};

use crate::cli::{CliArgs, Target};
use crate::config::{ContrailConfig, ProviderKind};

// ============================================================================
// ContrailApp
// ============================================================================

/// The worker as configured for one process run.
pub struct ContrailApp {
    config: ContrailConfig,
    args: CliArgs,
}

impl ContrailApp {
    /// Combine configuration and flags.
    pub fn new(config: ContrailConfig, args: CliArgs) -> Self {
        Self { config, args }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &ContrailConfig {
        &self.config
    }

    /// Directory receiving log files; `--log-dir` wins over config.
    pub fn log_dir(&self) -> PathBuf {
        self.args
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.logging.dir))
    }

    /// Records per type per pass.
    pub fn batch_size(&self) -> usize {
        self.args
            .batch_size
            .unwrap_or(self.config.pipeline.batch_size)
    }

    /// One-shot or continuous, with the effective intervals.
    pub fn run_mode(&self) -> RunMode {
        if !self.args.continuous {
            return RunMode::OneShot;
        }
        let interval = self
            .args
            .interval
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| self.config.pipeline.interval());
        RunMode::Continuous {
            interval,
            short_interval: self.config.pipeline.short_interval(),
        }
    }

    /// Batch settings from config and flags.
    pub fn batch_settings(&self) -> BatchSettings {
        let pipeline = &self.config.pipeline;
        BatchSettings {
            chunk_size: pipeline.chunk_size.max(1),
            chunk_pause: pipeline.chunk_pause(),
            dimension: pipeline.dimension,
            dry_run: self.args.dry_run,
        }
    }

    /// Retry policy for store reads.
    pub fn store_retry(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.config.store.max_retries)
    }

    /// The domain store client.
    pub fn build_store(&self) -> Result<Arc<dyn DomainStore>> {
        let cfg = &self.config.store;
        let store = PostgrestStore::new(&cfg.url, &cfg.api_key, cfg.timeout())?
            .with_retry(self.store_retry());
        Ok(Arc::new(store))
    }

    /// The configured embedding provider.
    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let cfg = &self.config.embedding;
        Ok(match cfg.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
                &cfg.api_key,
                &cfg.base_url,
                cfg.model.as_str(),
                cfg.dimensions,
                cfg.timeout(),
            )?),
            ProviderKind::Mock => Arc::new(MockEmbeddingProvider::new(
                cfg.dimensions.unwrap_or(self.config.pipeline.dimension),
            )),
        })
    }

    /// The persistence target selected by `--target`.
    pub fn build_sink(&self, store: Arc<dyn DomainStore>) -> Result<Arc<dyn EmbeddingSink>> {
        Ok(match self.args.target {
            Target::Domain => Arc::new(DomainColumnSink::new(store)),
            Target::VectorStore => {
                let cfg = &self.config.vector_store;
                let vectors =
                    QdrantVectorStore::new(&cfg.url, &cfg.api_key, &cfg.collection, cfg.timeout())?;
                Arc::new(VectorStoreSink::new(Arc::new(vectors)))
            }
        })
    }

    /// Assemble the scheduler over `store` and `provider`.
    pub fn build_scheduler(
        &self,
        store: Arc<dyn DomainStore>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Scheduler> {
        let rate = &self.config.rate_limit;
        let limiter = Arc::new(RateLimiter::new(rate.max_calls, rate.window()));
        let client = EmbeddingClient::new(provider, limiter);
        let sink = self.build_sink(store.clone())?;

        let processor = BatchProcessor::new(store.clone(), client, sink, self.batch_settings());
        let archiver = Archiver::new(
            store,
            self.config.pipeline.archive_after_days,
            self.args.dry_run,
        );
        let orchestrator =
            Orchestrator::new(processor, archiver, self.args.only, self.batch_size());
        Ok(Scheduler::new(orchestrator, self.run_mode()))
    }

    /// Build every adapter and run until done.
    ///
    /// Returns the last pass summary; in continuous mode this only returns
    /// on a setup error.
    pub async fn run(&self) -> Result<PassSummary> {
        let store = self.build_store()?;
        let provider = self.build_provider()?;
        tracing::info!(
            store = store.name(),
            provider = provider.name(),
            target = ?self.args.target,
            only = ?self.args.only,
            batch_size = self.batch_size(),
            mode = ?self.run_mode(),
            dry_run = self.args.dry_run,
            "starting embedding sync"
        );
        tracing::debug!("effective configuration:\n{}", self.config.to_redacted_toml_string()?);

        let mut scheduler = self.build_scheduler(store, provider)?;
        Ok(scheduler.run().await)
    }
}

// ============================================================================
// Tests
// ============================================================================
