//! Scripted downloaders shared by the pipeline and workflow tests.

use super::AcquisitionError;
use super::retry::Backoff;
use crate::downloaders::Strategy;
use crate::models::Resource;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Transient,
    Definitive,
}

/// A downloader replaying a fixed list of outcomes; the last one repeats.
#[derive(Debug)]
pub struct ScriptedStrategy {
    name: String,
    script: Vec<Outcome>,
    latency: Duration,
    calls: AtomicUsize,
    attempts: Mutex<Vec<u32>>,
    urls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedStrategy {
    pub fn new(name: &str, script: Vec<Outcome>) -> Self {
        Self {
            name: name.to_string(),
            script,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            attempts: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every attempt take `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn attempt_indices(&self) -> Vec<u32> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the attempt future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, url: &str, attempt: u32) -> Result<Resource, AcquisitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.attempts.lock().unwrap().push(attempt);
        self.urls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let outcome = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(Outcome::Success);

        match outcome {
            Outcome::Success => Ok(Resource::new(
                url,
                format!("<html><head><title>{url}</title></head><body><p>Body of {url}</p></body></html>"),
                self.name.as_str(),
            )),
            Outcome::Transient => Err(AcquisitionError::transient(
                &self.name,
                format!("timeout on attempt {attempt} for {url}"),
            )),
            Outcome::Definitive => Err(AcquisitionError::definitive(
                &self.name,
                format!("{url} is not available"),
            )),
        }
    }
}

/// Millisecond backoff so retry tests stay fast.
pub fn fast_backoff() -> Backoff {
    Backoff::new(
        Duration::from_millis(1),
        Duration::from_millis(4),
        Duration::ZERO,
    )
}
