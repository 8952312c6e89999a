//! The Contrail embedding pipeline.
//!
//! Keeps vector representations of marketplace records current. Each pass
//! selects records lacking an embedding, renders a text description per
//! record, embeds it under the shared rate limit, normalizes the vector,
//! and persists it.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (one-shot | continuous)
//!   └── Orchestrator (housekeeping, then types by priority)
//!         ├── Archiver
//!         └── BatchProcessor (chunks of 2, pause between chunks)
//!               ├── TypeHandler per RecordType
//!               │     ├── select_batch   (pending fn → null filter)
//!               │     ├── render         (rich → basic)
//!               │     └── after_embed    (bookkeeping)
//!               ├── EmbeddingClient      (rate limiter → provider)
//!               └── EmbeddingSink        (domain columns | vector store)
//! ```

pub mod batch;
pub mod fallback;
pub mod handlers;
pub mod housekeeping;
pub mod orchestrator;
pub mod scheduler;
pub mod selector;
pub mod sink;

pub use batch::{BatchProcessor, BatchSettings, DEFAULT_CHUNK_PAUSE, DEFAULT_CHUNK_SIZE};
pub use fallback::{Fallback, Outcome};
pub use handlers::{Rendered, TypeHandler, handler_for};
pub use housekeeping::{Archiver, DEFAULT_ARCHIVE_AFTER_DAYS};
pub use orchestrator::{DEFAULT_BATCH_SIZE, Orchestrator};
pub use scheduler::{
    DEFAULT_INTERVAL, DEFAULT_SHORT_INTERVAL, RunMode, RunState, Scheduler, next_interval,
};
pub use sink::{DomainColumnSink, EmbeddedRecord, EmbeddingSink, VectorStoreSink};
