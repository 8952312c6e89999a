//! Embedding and vector persistence for Contrail.
//!
//! This crate turns record text into vectors and stores them. It holds the
//! provider adapters, the shared rate limiter, and the vector-store
//! backends, plus in-memory doubles for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     contrail-vector                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingClient (rate limit gate + provider)               │
//! │  ├── RateLimiter (fixed window, shared across callers)      │
//! │  └── EmbeddingProvider trait                                │
//! │      ├── OpenAiProvider                                     │
//! │      └── MockEmbeddingProvider (always available)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorStore trait                                          │
//! │  ├── QdrantVectorStore                                      │
//! │  └── MemoryVectorStore (in-memory fallback)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use contrail_vector::{EmbeddingClient, MockEmbeddingProvider, RateLimiter};
//! use std::sync::Arc;
//!
//! let client = EmbeddingClient::new(
//!     Arc::new(MockEmbeddingProvider::new(1536)),
//!     Arc::new(RateLimiter::per_minute(2800)),
//! );
//! let raw = client.embed("Offer KJFK to EGLL").await?;
//! ```

pub mod client;
pub mod embedding;
pub mod openai;
pub mod qdrant;
pub mod rate_limit;
pub mod store;
pub mod types;

pub use client::EmbeddingClient;
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};
pub use openai::OpenAiProvider;
pub use qdrant::QdrantVectorStore;
pub use rate_limit::{RateLimiter, RateWindow};
pub use store::{MemoryVectorStore, VectorStore};
pub use types::VectorPoint;
