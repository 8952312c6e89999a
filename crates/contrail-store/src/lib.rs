//! Domain store access for Contrail.
//!
//! The relational store that owns marketplace records is an external
//! collaborator. This crate defines the narrow [`DomainStore`] interface the
//! worker needs and ships two implementations:
//!
//! - [`PostgrestStore`]: Supabase / PostgREST over HTTP, with retries for
//!   transient failures
//! - [`MemoryStore`]: in-memory tables with failure injection, for tests and
//!   local smoke runs

pub mod memory;
pub mod postgrest;
pub mod retry;
pub mod traits;

pub use memory::{LIMIT_ARG, MemoryStore, StoreCall};
pub use postgrest::PostgrestStore;
pub use retry::RetryPolicy;
pub use traits::{DomainStore, Filter, RowQuery, key_of};
