//! Shared types, errors, and static per-type configuration for Contrail.
//!
//! This crate provides the foundational types used across all Contrail
//! crates. It has no internal Contrail dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`record`]: Record types, type configuration table, and selection
//! - [`vector`]: Fixed-dimension embedding vectors and normalization
//! - [`run`]: Per-type and per-pass results

pub mod error;
pub mod record;
pub mod run;
pub mod vector;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use record::{ArchivalRule, Bookkeeping, RecordType, Row, TypeConfig, TypeSelection};
pub use run::{PassSummary, RunResult};
pub use vector::{EMBEDDING_DIMENSION, EmbeddingVector, normalize};
