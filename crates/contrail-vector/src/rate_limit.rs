//! Fixed-window rate limiter for embedding provider calls.
//!
//! The provider publishes a per-minute call ceiling. The limiter counts
//! calls in the current window and, once the configured budget (set below
//! the published ceiling) is spent, suspends the caller until the window
//! expires. Time comes from `tokio::time`, so tests run it under a paused
//! clock.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Calls made in the current window and when the window started.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    /// Calls counted since `started`.
    pub count: u32,
    /// Window start.
    pub started: Instant,
}

impl RateWindow {
    fn reset(&mut self, now: Instant) {
        self.count = 0;
        self.started = now;
    }
}

/// Shared call budget for the embedding provider.
///
/// All callers share one window. The window lock is held across the wait,
/// so concurrent callers serialize behind a single sleeper.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    state: Mutex<RateWindow>,
}

impl RateLimiter {
    /// Allow at most `max_calls` calls per `window`.
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            state: Mutex::new(RateWindow {
                count: 0,
                started: Instant::now(),
            }),
        }
    }

    /// Per-minute budget.
    pub fn per_minute(max_calls: u32) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    /// Configured ceiling per window.
    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a call fits in the budget, then count it.
    pub async fn check_and_wait(&self) {
        let mut state = self.state.lock().await;

        if state.started.elapsed() >= self.window {
            state.reset(Instant::now());
        }

        if state.count >= self.max_calls {
            let resume_at = state.started + self.window;
            tracing::info!(
                calls = state.count,
                max_calls = self.max_calls,
                wait_ms = resume_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "embedding rate limit reached, waiting for window to reset"
            );
            tokio::time::sleep_until(resume_at).await;
            state.reset(Instant::now());
        }

        state.count += 1;
    }

    /// Snapshot of the current window.
    pub async fn snapshot(&self) -> RateWindow {
        *self.state.lock().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_ceiling_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        assert_eq!(limiter.max_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_ceiling_do_not_wait() {
        let limiter = RateLimiter::per_minute(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.check_and_wait().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.snapshot().await.count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_induces_wait_until_window_end() {
        let limiter = RateLimiter::per_minute(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_and_wait().await;
        }
        limiter.check_and_wait().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(limiter.snapshot().await.count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry_resets_without_wait() {
        let limiter = RateLimiter::per_minute(2);
        limiter.check_and_wait().await;
        limiter.check_and_wait().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let before = Instant::now();
        limiter.check_and_wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(limiter.snapshot().await.count, 1);
    }

    fn paused_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn prop_window_never_over_budget(
            ceiling in 1u32..6,
            window_ms in 100u64..5_000,
            gaps in proptest::collection::vec(0u64..3_000, 1..40),
        ) {
            paused_runtime().block_on(async {
                let window = Duration::from_millis(window_ms);
                let limiter = RateLimiter::new(ceiling, window);
                let mut previous = limiter.snapshot().await;

                for gap in gaps {
                    tokio::time::advance(Duration::from_millis(gap)).await;
                    let before = Instant::now();
                    limiter.check_and_wait().await;
                    let after = Instant::now();
                    let current = limiter.snapshot().await;

                    prop_assert!(current.count >= 1);
                    prop_assert!(current.count <= ceiling);
                    prop_assert!(after - current.started < window);
                    if after > before {
                        // Only a full, unexpired window may hold a caller.
                        prop_assert_eq!(previous.count, ceiling);
                        prop_assert!(before - previous.started < window);
                        prop_assert_eq!(after, previous.started + window);
                    }
                    previous = current;
                }
                Ok(())
            })?;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_window() {
        let limiter = Arc::new(RateLimiter::per_minute(4));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check_and_wait().await;
                Instant::now()
            }));
        }
        let mut finished = Vec::new();
        for handle in handles {
            if let Ok(at) = handle.await {
                finished.push(at - start);
            }
        }
        let immediate = finished.iter().filter(|d| d.is_zero()).count();
        assert_eq!(immediate, 4);
        assert_eq!(finished.len(), 6);
        assert!(
            finished
                .iter()
                .filter(|d| !d.is_zero())
                .all(|d| *d == Duration::from_secs(60))
        );
    }
}
