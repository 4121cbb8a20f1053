//! Ordered fallback across downloaders.
//!
//! Downloaders run strictly in declared order, each under the retry
//! controller. The first success wins; later downloaders are never started.

use super::AcquisitionError;
use super::retry::RetryController;
use crate::downloaders::Strategy;
use crate::models::Resource;
use tracing::{instrument, warn};

#[derive(Debug)]
pub struct FallbackChain<S> {
    strategies: Vec<S>,
    retry: RetryController,
}

impl<S: Strategy> FallbackChain<S> {
    pub fn new(strategies: Vec<S>, retry: RetryController) -> Self {
        Self { strategies, retry }
    }

    /// Names of the downloaders in the order they are tried.
    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    #[cfg(test)]
    pub fn strategies_for_test(&self) -> &[S] {
        &self.strategies
    }

    /// Resolve `url` with the first downloader that succeeds.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<Resource, AcquisitionError> {
        let mut attempted = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            attempted.push(strategy.name().to_string());
            match self.retry.run(strategy, url).await {
                Ok(resource) => return Ok(resource),
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        max_attempts = self.retry.max_attempts(),
                        error = %e,
                        "Falling through to next downloader"
                    );
                }
            }
        }

        Err(AcquisitionError::exhausted(url, attempted))
    }
}
