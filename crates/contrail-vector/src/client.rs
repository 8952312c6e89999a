//! Rate-limited embedding client.

use std::sync::Arc;

use contrail_core::Result;
use tracing::{Instrument, debug_span};

use crate::embedding::EmbeddingProvider;
use crate::rate_limit::RateLimiter;

/// Wraps an [`EmbeddingProvider`] so every call first passes the shared
/// [`RateLimiter`].
///
/// Provider errors propagate unchanged. A failed call still spends budget.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    limiter: Arc<RateLimiter>,
}

impl EmbeddingClient {
    /// Create a client around `provider`, gated by `limiter`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, limiter: Arc<RateLimiter>) -> Self {
        Self { provider, limiter }
    }

    /// Embed one text, waiting for rate-limit budget first.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.limiter
            .check_and_wait()
            .instrument(debug_span!("rate_limiter"))
            .await;
        self.provider.embed(text).await
    }

    /// The underlying provider's name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The shared limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
