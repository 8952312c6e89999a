//! The provider seam and an offline provider.
//!
//! [`EmbeddingProvider`] is what the client calls to turn one text into a
//! raw vector. Real deployments use [`crate::OpenAiProvider`]; tests and
//! `provider = "mock"` runs use [`MockEmbeddingProvider`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contrail_core::{Error, Result};

/// A text-embedding backend.
///
/// One call embeds exactly one text, so every call costs one unit of the
/// rate limiter's budget.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text`.
    ///
    /// The returned width is whatever the backend produced; callers
    /// normalize it to the store dimension.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Width the backend usually returns, if known.
    fn dimension(&self) -> Option<usize>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Offline provider producing stable unit vectors.
///
/// The same text always yields the same vector. Texts containing the
/// failure marker are rejected with a provider error.
pub struct MockEmbeddingProvider {
    dimension: usize,
    failure_marker: Option<String>,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Provider returning vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failure_marker: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reject every text containing `marker`.
    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_marker = Some(marker.into());
        self
    }

    /// Calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        // FNV-1a seed, then an xorshift stream per component.
        let mut state = text
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            })
            | 1;
        let raw: Vec<f32> = (0..self.dimension)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 40) as f32 / (1u64 << 24) as f32 - 0.5
            })
            .collect();

        let length = raw.iter().map(|c| c * c).sum::<f32>().sqrt();
        if length == 0.0 {
            return raw;
        }
        raw.into_iter().map(|c| c / length).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self
            .failure_marker
            .as_deref()
            .filter(|m| text.contains(m))
        {
            return Err(Error::provider(format!(
                "mock provider rejected text containing {marker:?}"
            )));
        }
        Ok(self.vector_for(text))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn length(v: &[f32]) -> f32 {
        v.iter().map(|c| c * c).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_vectors_are_unit_length_at_requested_width() {
        let provider = MockEmbeddingProvider::new(12);
        assert_eq!(provider.dimension(), Some(12));
        assert_eq!(provider.name(), "mock");

        let v = provider.embed("Gulfstream G650, 14 seats").await.unwrap();
        assert_eq!(v.len(), 12);
        assert!((length(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_same_text_same_vector() {
        let provider = MockEmbeddingProvider::new(16);
        let a = tokio_test::block_on(provider.embed("KTEB to KPBI")).unwrap();
        let b = tokio_test::block_on(provider.embed("KTEB to KPBI")).unwrap();
        let c = tokio_test::block_on(provider.embed("KPBI to KTEB")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_text_still_embeds() {
        let provider = MockEmbeddingProvider::new(4);
        assert_eq!(provider.embed("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_marker_rejects_and_counts() {
        let provider = MockEmbeddingProvider::new(4).with_failure_marker("POISON");
        assert!(provider.embed("fine").await.is_ok());
        let err = provider.embed("contains POISON here").await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let provider: Box<dyn EmbeddingProvider> = Box::new(MockEmbeddingProvider::new(2));
        assert_eq!(provider.dimension(), Some(2));
    }
}
