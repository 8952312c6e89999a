//! Ordered fallback chains.
//!
//! A [`Fallback`] is a list of named strategies producing the same value.
//! Strategies run in order; the first success wins and later strategies
//! never run. Each failure is logged with the strategy name. When every
//! strategy fails the last error is returned.

use std::future::Future;

use contrail_core::{Error, Result};
use futures::FutureExt;
use futures::future::BoxFuture;

type Strategy<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T>> + Send + 'a>;

/// The winning strategy's name and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Name of the strategy that succeeded.
    pub strategy: &'static str,
    /// Its value.
    pub value: T,
}

/// An ordered chain of named strategies.
pub struct Fallback<'a, T> {
    label: &'static str,
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

impl<'a, T: Send + 'a> Fallback<'a, T> {
    /// Start an empty chain; `label` names it in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn then<F, Fut>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T>> + Send + 'a,
    {
        self.strategies
            .push((name, Box::new(move || strategy().boxed())));
        self
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order until one succeeds.
    pub async fn run(self) -> Result<Outcome<T>> {
        let label = self.label;
        let mut last_error = None;
        for (name, strategy) in self.strategies {
            match strategy().await {
                Ok(value) => {
                    return Ok(Outcome {
                        strategy: name,
                        value,
                    });
                }
                Err(e) => {
                    tracing::debug!(chain = label, strategy = name, error = %e, "strategy failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Exhausted(format!("{label}: no strategies"))))
    }

    /// Run the chain and keep only the value.
    pub async fn first_success(self) -> Result<T> {
        self.run().await.map(|outcome| outcome.value)
    }
}
