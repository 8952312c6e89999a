//! One-shot and continuous run loop.
//!
//! The scheduler owns the [`Orchestrator`] and moves through
//! `Idle → RunningPass → (Sleeping → RunningPass)*` in continuous mode, or
//! `Idle → RunningPass → Done` in one-shot mode. Sleeping is a plain
//! `tokio::time` delay; continuous mode ends only when the process does.

use std::time::Duration;

use contrail_core::PassSummary;
use tokio::time::Instant;

use crate::orchestrator::Orchestrator;

/// Default pause between continuous passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Ceiling on the pause after a pass that processed records.
pub const DEFAULT_SHORT_INTERVAL: Duration = Duration::from_secs(30);

/// How the scheduler repeats passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run one pass, then stop.
    OneShot,
    /// Run passes forever.
    Continuous {
        /// Pause after an idle pass.
        interval: Duration,
        /// Upper bound on the pause after a productive pass.
        short_interval: Duration,
    },
}

impl RunMode {
    /// Continuous mode with the default short interval.
    pub fn continuous(interval: Duration) -> Self {
        Self::Continuous {
            interval,
            short_interval: DEFAULT_SHORT_INTERVAL,
        }
    }
}

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started.
    Idle,
    /// A pass is in progress.
    RunningPass,
    /// Waiting for the next pass.
    Sleeping {
        /// When the next pass starts.
        until: Instant,
    },
    /// Finished; no more passes.
    Done,
}

/// Pause before the next pass.
///
/// A productive pass drains backlog sooner: `min(interval, short)`.
/// An idle pass waits the full interval.
pub fn next_interval(processed: usize, interval: Duration, short: Duration) -> Duration {
    if processed > 0 {
        interval.min(short)
    } else {
        interval
    }
}

/// Drives the orchestrator.
pub struct Scheduler {
    orchestrator: Orchestrator,
    mode: RunMode,
    state: RunState,
    passes: u64,
}

impl Scheduler {
    /// Create an idle scheduler.
    pub fn new(orchestrator: Orchestrator, mode: RunMode) -> Self {
        Self {
            orchestrator,
            mode,
            state: RunState::Idle,
            passes: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// When the next pass starts, if one is scheduled.
    pub fn next_wake(&self) -> Option<Instant> {
        match self.state {
            RunState::Sleeping { until } => Some(until),
            _ => None,
        }
    }

    /// Passes completed so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Wait out any pending sleep, run one pass, and schedule the next.
    ///
    /// Returns `None` once the scheduler is done.
    pub async fn step(&mut self) -> Option<PassSummary> {
        match self.state {
            RunState::Done => return None,
            RunState::Sleeping { until } => tokio::time::sleep_until(until).await,
            RunState::Idle | RunState::RunningPass => {}
        }

        self.state = RunState::RunningPass;
        self.passes += 1;
        tracing::info!(pass = self.passes, "starting pass");
        let summary = self.orchestrator.run_pass().await;

        self.state = match self.mode {
            RunMode::OneShot => RunState::Done,
            RunMode::Continuous {
                interval,
                short_interval,
            } => {
                let pause = next_interval(summary.total_processed(), interval, short_interval);
                tracing::info!(sleep_secs = pause.as_secs(), "sleeping until next pass");
                RunState::Sleeping {
                    until: Instant::now() + pause,
                }
            }
        };
        Some(summary)
    }

    /// Run until done and return the last pass summary.
    ///
    /// In continuous mode this never returns.
    pub async fn run(&mut self) -> PassSummary {
        let mut last = PassSummary::default();
        while let Some(summary) = self.step().await {
            last = summary;
        }
        last
    }
}
