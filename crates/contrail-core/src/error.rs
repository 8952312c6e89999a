//! Error types for Contrail operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Contrail crates. Uses `thiserror` for derive macros.
//!
//! The variants follow the pipeline's failure taxonomy: store errors abort a
//! record type's pass, provider and record errors are isolated per record,
//! and the two "schema" variants ([`Error::Unavailable`] and
//! [`Error::MissingColumn`]) drive the fallback strategies.

use thiserror::Error;

/// Errors that can occur in Contrail operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record or related row not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The domain store rejected or failed a request.
    #[error("Store error: {message}")]
    Store {
        /// Human-readable description.
        message: String,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },

    /// A store-side query or function does not exist.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// A write referenced a column the table does not have.
    #[error("Missing column '{column}' on {table}")]
    MissingColumn {
        /// Table the write targeted.
        table: String,
        /// Column the store did not recognise.
        column: String,
    },

    /// The embedding provider failed.
    #[error("Provider error: {message}")]
    Provider {
        /// Human-readable description.
        message: String,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },

    /// The vector store failed.
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Every strategy of a fallback chain failed.
    #[error("All strategies failed: {0}")]
    Exhausted(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a non-retryable store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a store error that is worth retrying (timeouts, 5xx).
    pub fn store_transient(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a missing column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a provider error for rate limiting or server failures.
    pub fn provider_transient(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a vector store error.
    pub fn vector_store(msg: impl Into<String>) -> Self {
        Self::VectorStore(msg.into())
    }

    /// Whether the failed operation may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { retryable, .. } | Self::Provider { retryable, .. } => *retryable,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Whether this error reports a missing column.
    pub fn is_missing_column(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }

    /// Whether this error reports a missing store-side query.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Contrail's Error type.
pub type Result<T> = std::result::Result<T, Error>;
