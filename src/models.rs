//! Data models passed between the acquisition pipeline and the workflow.
//!
//! - [`Resource`]: raw markup produced by a successful acquisition
//! - [`ArticleRecord`]: the normalised article persisted for each URL

use serde::{Deserialize, Serialize};

/// A fetched web resource.
///
/// Produced exactly once per successful `acquire` call and handed to the
/// caller by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The URL the content was actually read from (e.g. an archive snapshot).
    pub resolved_url: String,
    /// Raw markup as returned by the downloader.
    pub content: String,
    /// Name of the downloader that produced this resource.
    pub strategy: String,
}

impl Resource {
    pub fn new(
        resolved_url: impl Into<String>,
        content: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            resolved_url: resolved_url.into(),
            content: content.into(),
            strategy: strategy.into(),
        }
    }
}

/// A scraped article, ready to be written to the run's outputs.
///
/// Field order matches the columns of `results.csv`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Filesystem-safe identifier derived from the URL.
    pub id: String,
    /// The URL as given on the command line.
    pub url: String,
    /// The URL the content was fetched from.
    pub resolved_url: String,
    /// Downloader that satisfied the request.
    pub strategy: String,
    /// Extracted headline.
    pub title: String,
    /// Extracted body text.
    pub content: String,
    /// Cleaned markup; written to its own artifact, not to the CSV.
    #[serde(skip)]
    pub html: String,
}

impl ArticleRecord {
    /// Column names of `results.csv`.
    pub const CSV_HEADER: [&'static str; 6] =
        ["id", "url", "resolved_url", "strategy", "title", "content"];

    /// The record as a CSV row, in [`Self::CSV_HEADER`] order.
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.url.clone(),
            self.resolved_url.clone(),
            self.strategy.clone(),
            self.title.clone(),
            self.content.clone(),
        ]
    }
}
