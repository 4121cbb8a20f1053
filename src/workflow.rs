//! Batch scraping over a list of article URLs.
//!
//! Each URL goes through acquire → clean → extract → persist. URLs are
//! processed concurrently, at most `workers` at a time; a failure on one URL
//! is logged and never stops the batch.

use crate::acquisition::AcquisitionService;
use crate::downloaders::Strategy;
use crate::extract::{clean_html, extract_article};
use crate::models::ArticleRecord;
use crate::outputs::OutputStore;
use crate::utils::{article_id, truncate_for_log};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use tracing::{error, info, instrument, warn};

/// How a batch should run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Acquire and extract, but write nothing.
    pub dry_run: bool,
    /// Maximum concurrent acquisitions.
    pub workers: usize,
}

/// Result of processing one URL.
#[derive(Debug)]
pub enum ArticleOutcome {
    Scraped(ArticleRecord),
    Failed { url: String, reason: String },
}

/// Totals for a finished batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// URLs handed to the batch.
    pub total: usize,
    /// URLs skipped because the run already recorded them.
    pub skipped: usize,
    pub outcomes: Vec<ArticleOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArticleOutcome::Scraped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Acquire and normalise a single article. Nothing is written here.
#[instrument(level = "info", skip(service))]
pub async fn scrape_article<S: Strategy>(
    service: &AcquisitionService<S>,
    url: &str,
) -> Result<ArticleRecord, Box<dyn Error>> {
    let resource = service.acquire(url).await?;
    let html = clean_html(&resource.content);
    let extracted = extract_article(&html);

    info!(
        title = %truncate_for_log(&extracted.title, 120),
        strategy = %resource.strategy,
        "Article extracted"
    );

    Ok(ArticleRecord {
        id: article_id(url),
        url: url.to_string(),
        resolved_url: resource.resolved_url,
        strategy: resource.strategy,
        title: extracted.title,
        content: extracted.content,
        html,
    })
}

async fn process_article<S: Strategy>(
    service: &AcquisitionService<S>,
    store: &OutputStore,
    url: String,
    dry_run: bool,
) -> ArticleOutcome {
    let article = match scrape_article(service, &url).await {
        Ok(article) => article,
        Err(e) => {
            warn!(%url, error = %e, "Skipping article");
            return ArticleOutcome::Failed {
                url,
                reason: e.to_string(),
            };
        }
    };

    if dry_run {
        info!(%url, "Dry run; not persisting");
        return ArticleOutcome::Scraped(article);
    }

    match store.persist(&article).await {
        Ok(()) => ArticleOutcome::Scraped(article),
        Err(e) => {
            error!(%url, error = %e, "Failed to persist article");
            ArticleOutcome::Failed {
                url,
                reason: e.to_string(),
            }
        }
    }
}

/// Process `urls`, skipping those the run has already recorded.
///
/// At most `options.workers` URLs are in flight at once. A URL that fails
/// to acquire or persist is logged and reported, and the rest of the batch
/// carries on.
///
/// # Arguments
///
/// * `service` - Acquisition pipeline shared by every worker
/// * `store` - Run directory the results are read from and written to
/// * `urls` - Input URLs, already validated and de-duplicated
/// * `options` - Dry-run flag and pool size
///
/// # Returns
///
/// A [`BatchReport`] with one outcome per URL that was not skipped, or an
/// error if the existing `results.csv` cannot be read.
#[instrument(level = "info", skip_all, fields(urls = urls.len(), dry_run = options.dry_run, workers = options.workers))]
pub async fn process_articles<S: Strategy>(
    service: &AcquisitionService<S>,
    store: &OutputStore,
    urls: Vec<String>,
    options: &RunOptions,
) -> Result<BatchReport, Box<dyn Error>> {
    let total = urls.len();
    let completed = store.completed_urls().await?;
    let pending: Vec<String> = urls
        .into_iter()
        .filter(|url| !completed.contains(url))
        .collect();
    let skipped = total - pending.len();
    if skipped > 0 {
        info!(skipped, "Resuming run; skipping already scraped URLs");
    }

    let progress = ProgressBar::new(pending.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let workers = options.workers.max(1);
    let outcomes: Vec<ArticleOutcome> = stream::iter(pending)
        .map(|url| {
            let progress = progress.clone();
            async move {
                let outcome = process_article(service, store, url, options.dry_run).await;
                progress.inc(1);
                outcome
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;
    progress.finish_and_clear();

    let report = BatchReport {
        total,
        skipped,
        outcomes,
    };
    info!(
        total = report.total,
        skipped = report.skipped,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch complete"
    );
    Ok(report)
}
