//! Per-downloader retry with exponential backoff.
//!
//! # Retry Strategy
//!
//! - At most `max_attempts` invocations of the downloader (at least one)
//! - Only [`FailureKind::Transient`](super::FailureKind::Transient) errors
//!   are retried; anything else is returned straight away
//! - Exponential backoff starting at `base`, capped at `max`
//! - Random jitter (0..=`jitter`) added to spread out concurrent retries
//! - Each delay is at least as long as the previous one
//!
//! ```text
//! delay(n) = max(delay(n-1), min(base * 2^n, max) + random_jitter)
//! ```

use super::AcquisitionError;
use crate::config::BackoffConfig;
use crate::downloaders::Strategy;
use crate::models::Resource;
use rand::{Rng, rng};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Delay schedule between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: Duration,
}

impl Backoff {
    /// Smallest base delay; a zero base would retry in a tight loop.
    pub const MIN_BASE: Duration = Duration::from_millis(1);

    /// `base` is clamped to [`Backoff::MIN_BASE`] and `max` to at least `base`.
    pub fn new(base: Duration, max: Duration, jitter: Duration) -> Self {
        let base = base.max(Self::MIN_BASE);
        Self {
            base,
            max: max.max(base),
            jitter,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_ms),
            Duration::from_millis(config.max_ms),
            Duration::from_millis(config.jitter_ms),
        )
    }

    /// Exponential part of the delay after the failed attempt `attempt` (0-based).
    fn exponential(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay to wait after attempt `attempt` failed, never shorter than `previous`.
    pub fn delay(&self, attempt: u32, previous: Duration) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng().random_range(0..=jitter_ms))
        };
        (self.exponential(attempt) + jitter).max(previous)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}

/// Re-invokes a downloader until it succeeds, fails definitively, or runs
/// out of attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryController {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `strategy` against `url` until it succeeds or gives up.
    ///
    /// Attempt indices start at 0 and are passed to the downloader, which may
    /// scale its own effort with them. Between transient failures the task
    /// sleeps for the next [`Backoff::delay`].
    ///
    /// # Arguments
    ///
    /// * `strategy` - The downloader to invoke
    /// * `url` - The article URL being acquired
    ///
    /// # Returns
    ///
    /// The first successful [`Resource`]. Otherwise the error of the final
    /// attempt: the first non-retryable one, or the last transient one once
    /// `max_attempts` invocations have been made.
    #[instrument(level = "info", skip_all, fields(strategy = strategy.name(), %url))]
    pub async fn run<S: Strategy>(
        &self,
        strategy: &S,
        url: &str,
    ) -> Result<Resource, AcquisitionError> {
        let total_t0 = Instant::now();
        let mut previous_delay = Duration::ZERO;
        let mut attempt = 0u32;

        loop {
            let attempt_t0 = Instant::now();
            let err = match strategy.attempt(url, attempt).await {
                Ok(resource) => {
                    info!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Downloader succeeded"
                    );
                    return Ok(resource);
                }
                Err(err) => err,
            };

            let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
            let elapsed_ms_total = total_t0.elapsed().as_millis();

            if !err.retryable() {
                warn!(
                    attempt,
                    elapsed_ms_attempt,
                    error = %err,
                    "Downloader failed definitively; not retrying"
                );
                return Err(err);
            }

            attempt += 1;
            if attempt >= self.max_attempts {
                error!(
                    attempt,
                    max = self.max_attempts,
                    elapsed_ms_attempt,
                    elapsed_ms_total,
                    error = %err,
                    "Downloader exhausted retries"
                );
                return Err(err);
            }

            let delay = self.backoff.delay(attempt - 1, previous_delay);
            previous_delay = delay;
            warn!(
                attempt,
                max = self.max_attempts,
                elapsed_ms_attempt,
                elapsed_ms_total,
                ?delay,
                error = %err,
                "Downloader attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}
