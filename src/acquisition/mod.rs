//! The acquisition pipeline.
//!
//! ```text
//! AcquisitionService::acquire
//!   -> ResourceCache (optional)
//!   -> FallbackChain        (downloaders in declared order)
//!     -> RetryController    (attempts + backoff per downloader)
//!       -> Strategy         (archive / render / direct)
//! ```
//!
//! [`AcquisitionService::acquire`] is the only entry point the scraping
//! workflow uses. It yields exactly one outcome per call: a [`Resource`] or
//! an [`AcquisitionError`]. Dropping the returned future cancels the
//! acquisition; no retry is scheduled afterwards.

pub mod cache;
pub mod chain;
pub mod error;
pub mod retry;

#[cfg(test)]
pub mod testing;

pub use cache::{LruResourceCache, ResourceCache};
pub use chain::FallbackChain;
pub use error::{AcquisitionError, FailureKind};
pub use retry::{Backoff, RetryController};

use crate::config::FetchConfig;
use crate::downloaders::{self, Downloader, Strategy};
use crate::models::Resource;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Public face of the pipeline.
pub struct AcquisitionService<S = Downloader> {
    chain: FallbackChain<S>,
    cache: Option<Box<dyn ResourceCache>>,
}

impl AcquisitionService<Downloader> {
    /// Build the service described by `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let retry = RetryController::new(
            config.max_attempts,
            Backoff::from_config(&config.backoff),
        );
        let chain = FallbackChain::new(downloaders::from_config(config)?, retry);
        let service = Self::new(chain);

        Ok(if config.cache_capacity > 0 {
            service.with_cache(Box::new(LruResourceCache::new(config.cache_capacity)))
        } else {
            service
        })
    }
}

impl<S: Strategy> AcquisitionService<S> {
    pub fn new(chain: FallbackChain<S>) -> Self {
        Self { chain, cache: None }
    }

    pub fn with_cache(mut self, cache: Box<dyn ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn chain(&self) -> &FallbackChain<S> {
        &self.chain
    }

    /// Fetch `url` through the fallback chain.
    ///
    /// The cache is consulted first when one is configured, and only
    /// successes are stored in it. Dropping the returned future stops the
    /// acquisition; no further attempt is started.
    ///
    /// # Arguments
    ///
    /// * `url` - The article URL to acquire
    ///
    /// # Returns
    ///
    /// The [`Resource`] from the first downloader that succeeded, or a
    /// single [`FailureKind::ChainExhausted`] error naming every downloader
    /// that was tried.
    #[instrument(level = "info", skip(self))]
    pub async fn acquire(&self, url: &str) -> Result<Resource, AcquisitionError> {
        if let Some(resource) = self.cache.as_ref().and_then(|c| c.get(url)) {
            debug!(strategy = %resource.strategy, "Cache hit");
            return Ok(resource);
        }

        let t0 = Instant::now();
        let result = self.chain.resolve(url).await;
        let elapsed_ms = t0.elapsed().as_millis();

        match &result {
            Ok(resource) => {
                info!(
                    strategy = %resource.strategy,
                    resolved_url = %resource.resolved_url,
                    bytes = resource.content.len(),
                    elapsed_ms,
                    "Acquired"
                );
                if let Some(cache) = &self.cache {
                    cache.put(url, resource.clone());
                }
            }
            Err(e) => warn!(elapsed_ms, attempted = ?e.attempted, error = %e, "Acquisition failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::testing::{Outcome, ScriptedStrategy, fast_backoff};
    use std::time::Duration;

    fn service(strategies: Vec<ScriptedStrategy>, max_attempts: u32) -> AcquisitionService<ScriptedStrategy> {
        AcquisitionService::new(FallbackChain::new(
            strategies,
            RetryController::new(max_attempts, fast_backoff()),
        ))
    }

    #[tokio::test]
    async fn test_acquire_exposes_winning_strategy_name() {
        let svc = service(
            vec![
                ScriptedStrategy::new("archive", vec![Outcome::Definitive]),
                ScriptedStrategy::new("direct", vec![Outcome::Success]),
            ],
            2,
        );

        let resource = svc.acquire("https://example.com/a").await.unwrap();
        assert_eq!(resource.strategy, "direct");
        assert_eq!(resource.resolved_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_acquire_yields_single_terminal_error() {
        let svc = service(
            vec![
                ScriptedStrategy::new("archive", vec![Outcome::Transient]),
                ScriptedStrategy::new("direct", vec![Outcome::Transient]),
            ],
            2,
        );

        let err = svc.acquire("https://example.com/a").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ChainExhausted);
        assert_eq!(svc.chain().names(), err.attempted);
    }

    #[tokio::test]
    async fn test_cache_short_circuits_second_acquire() {
        let svc = service(vec![ScriptedStrategy::new("direct", vec![Outcome::Success])], 1)
            .with_cache(Box::new(LruResourceCache::new(8)));

        let first = svc.acquire("https://example.com/a").await.unwrap();
        let second = svc.acquire("https://example.com/a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(svc.chain().strategies_for_test()[0].calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let svc = service(
            vec![ScriptedStrategy::new(
                "direct",
                vec![Outcome::Definitive, Outcome::Success],
            )],
            1,
        )
        .with_cache(Box::new(LruResourceCache::new(8)));

        assert!(svc.acquire("https://example.com/a").await.is_err());
        assert!(svc.acquire("https://example.com/a").await.is_ok());
        assert_eq!(svc.chain().strategies_for_test()[0].calls(), 2);
    }

    #[tokio::test]
    async fn test_dropping_acquire_stops_retries() {
        let svc = service(
            vec![ScriptedStrategy::new("render", vec![Outcome::Transient])
                .with_latency(Duration::from_millis(20))],
            1000,
        );

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            svc.acquire("https://example.com/slow"),
        )
        .await;
        assert!(result.is_err(), "acquire should have been cancelled");

        let strategy = &svc.chain().strategies_for_test()[0];
        let calls_at_cancel = strategy.calls();
        assert_eq!(strategy.in_flight(), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(strategy.calls(), calls_at_cancel);
        assert!(calls_at_cancel < 1000);
    }
}
