//! Error taxonomy for the acquisition pipeline.
//!
//! Downloaders classify their own failures; the retry controller and the
//! fallback chain only ever look at [`FailureKind`].

use thiserror::Error;

/// How a failure should be treated by the layers above the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network hiccups, timeouts, browser crashes. Retried with backoff.
    Transient,
    /// The source confirmed the resource is absent. Skips the remaining
    /// attempts of the current downloader only.
    Definitive,
    /// Every downloader in the chain gave up on the URL.
    ChainExhausted,
}

/// A classified acquisition failure.
///
/// Values are created once (by a downloader, or by the chain for the
/// aggregate) and only ever moved upwards afterwards.
#[derive(Debug, Clone, Error)]
#[error("[{strategy}] {message}")]
pub struct AcquisitionError {
    /// Human readable description, already mentioning the URL.
    pub message: String,
    /// Classification driving retry and fallback decisions.
    pub kind: FailureKind,
    /// Name of the downloader that produced the error (`"chain"` for the aggregate).
    pub strategy: String,
    /// Downloaders attempted before giving up; filled for [`FailureKind::ChainExhausted`].
    pub attempted: Vec<String>,
}

impl AcquisitionError {
    /// A failure worth retrying in place.
    pub fn transient(strategy: &str, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, strategy, message)
    }

    /// A failure that no amount of retrying this downloader will fix.
    pub fn definitive(strategy: &str, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Definitive, strategy, message)
    }

    /// Terminal aggregate error for a URL no downloader could fetch.
    pub fn exhausted(url: &str, attempted: Vec<String>) -> Self {
        let message = if attempted.is_empty() {
            format!("No downloaders configured for {url}.")
        } else {
            format!(
                "No downloaders could download {url} (tried: {}).",
                attempted.join(", ")
            )
        };
        Self {
            message,
            kind: FailureKind::ChainExhausted,
            strategy: "chain".to_string(),
            attempted,
        }
    }

    fn new(kind: FailureKind, strategy: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            strategy: strategy.to_string(),
            attempted: Vec::new(),
        }
    }

    /// Whether the retry controller may invoke the same downloader again.
    pub fn retryable(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}
