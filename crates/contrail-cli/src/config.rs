//! Configuration for the Contrail worker.
//!
//! Provides the [`ContrailConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `CONTRAIL_CONFIG` environment variable
//! 3. XDG default: `~/.config/contrail/config.toml`
//! 4. Built-in defaults
//!
//! `CONTRAIL_<SECTION>_<KEY>` environment variables are overlaid on top,
//! e.g. `CONTRAIL_STORE_API_KEY` or `CONTRAIL_PIPELINE_CHUNK_SIZE`.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use confyg::{Confygery, env};
use contrail_core::{EMBEDDING_DIMENSION, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CONTRAIL_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrailConfig {
    /// Domain store connection.
    pub store: StoreConfig,

    /// Embedding provider.
    pub embedding: EmbeddingConfig,

    /// Provider call budget.
    pub rate_limit: RateLimitConfig,

    /// External vector index, used with `--target=vector-store`.
    pub vector_store: VectorStoreConfig,

    /// Pipeline tunables.
    pub pipeline: PipelineConfig,

    /// Log file placement.
    pub logging: LoggingConfig,
}

/// Domain store (PostgREST) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,

    /// Service API key.
    pub api_key: String,

    /// Per-request timeout in seconds.
    #[serde(deserialize_with = "lenient")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on transient failures (0 disables).
    #[serde(deserialize_with = "lenient")]
    pub max_retries: u32,
}

/// Which embedding provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible HTTP API.
    #[default]
    OpenAi,
    /// Deterministic local vectors; no network.
    Mock,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider implementation.
    pub provider: ProviderKind,

    /// API key.
    pub api_key: String,

    /// API base URL.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Requested output width, if the model supports choosing one.
    pub dimensions: Option<usize>,

    /// Per-request timeout in seconds.
    #[serde(deserialize_with = "lenient")]
    pub timeout_secs: u64,
}

/// Provider call budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls allowed per window; keep below the provider's published limit.
    #[serde(deserialize_with = "lenient")]
    pub max_calls: u32,

    /// Window length in seconds.
    #[serde(deserialize_with = "lenient")]
    pub window_secs: u64,
}

/// Qdrant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Cluster URL.
    pub url: String,

    /// API key; empty for unauthenticated clusters.
    pub api_key: String,

    /// Target collection.
    pub collection: String,

    /// Per-request timeout in seconds.
    #[serde(deserialize_with = "lenient")]
    pub timeout_secs: u64,
}

/// Pipeline tunables. The CLI flags override the batch and interval
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Persisted vector length.
    #[serde(deserialize_with = "lenient")]
    pub dimension: usize,

    /// Records selected per type per pass.
    #[serde(deserialize_with = "lenient")]
    pub batch_size: usize,

    /// Records processed concurrently.
    #[serde(deserialize_with = "lenient")]
    pub chunk_size: usize,

    /// Pause between chunks in milliseconds.
    #[serde(deserialize_with = "lenient")]
    pub chunk_pause_ms: u64,

    /// Pause between idle continuous passes in seconds.
    #[serde(deserialize_with = "lenient")]
    pub interval_secs: u64,

    /// Ceiling on the pause after a productive pass, in seconds.
    #[serde(deserialize_with = "lenient")]
    pub short_interval_secs: u64,

    /// Completed records older than this are archived.
    #[serde(deserialize_with = "lenient")]
    pub archive_after_days: u64,
}

/// Log file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory receiving session and error logs.
    pub dir: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            timeout_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 2800,
            window_secs: 60,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            collection: "marketplace".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIMENSION,
            batch_size: 50,
            chunk_size: 2,
            chunk_pause_ms: 1000,
            interval_secs: 300,
            short_interval_secs: 30,
            archive_after_days: 90,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
        }
    }
}

// ============================================================================
// Duration accessors
// ============================================================================

impl StoreConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EmbeddingConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl VectorStoreConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Pause between chunks.
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    /// Pause between idle passes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Ceiling on the pause after a productive pass.
    pub fn short_interval(&self) -> Duration {
        Duration::from_secs(self.short_interval_secs)
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl ContrailConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("CONTRAIL");
        for section in [
            "store",
            "embedding",
            "rate_limit",
            "vector_store",
            "pipeline",
            "logging",
        ] {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("contrail").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Same as [`to_toml_string`](Self::to_toml_string) with secrets masked.
    pub fn to_redacted_toml_string(&self) -> Result<String> {
        let mut redacted = self.clone();
        for secret in [
            &mut redacted.store.api_key,
            &mut redacted.embedding.api_key,
            &mut redacted.vector_store.api_key,
        ] {
            if !secret.is_empty() {
                *secret = "***".to_string();
            }
        }
        redacted.to_toml_string()
    }
}

// ============================================================================
// Helper: numbers from env strings
// ============================================================================

/// Environment overlays arrive as strings; accept either a number or a
/// string holding one.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Value(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Value(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Tests
// ============================================================================
