//! # Article Fetch
//!
//! Scrapes news articles that may no longer be reachable at their original
//! address. Each URL is acquired through an ordered chain of downloaders,
//! then cleaned, reduced to title and body text, and written to a run
//! directory.
//!
//! ## Usage
//!
//! ```sh
//! article_fetch -f urls.txt -o ./results
//! ```
//!
//! ## Architecture
//!
//! 1. **Acquisition**: archive snapshot → headless render → direct GET,
//!    each retried with backoff on transient failures
//! 2. **Normalisation**: strip non-content markup, extract title and body
//! 3. **Output**: append to `results.csv`, write Markdown and HTML artifacts
//!
//! Up to `workers` URLs are in flight at once; a failed URL is logged and
//! skipped without stopping the batch.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod acquisition;
mod cli;
mod config;
mod downloaders;
mod extract;
mod models;
mod outputs;
mod utils;
mod workflow;

use acquisition::AcquisitionService;
use cli::Cli;
use outputs::{OutputStore, RunPaths};
use utils::{ensure_writable_dir, parse_url_list, read_url_file, run_id};
use workflow::{ArticleOutcome, RunOptions, process_articles};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_fetch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = config::load_config(args.config.as_deref()).await?;
    args.apply_overrides(&mut config);

    // ---- Input ----
    let urls = match &args.file {
        Some(file) => read_url_file(file).await?,
        None => parse_url_list(args.urls.iter().map(String::as_str)),
    };
    if urls.is_empty() {
        error!("No valid URLs to scrape");
        return Err("no valid URLs to scrape".into());
    }

    // ---- Run directory ----
    let run = args
        .run_id
        .clone()
        .unwrap_or_else(|| run_id(Local::now(), args.batch.as_deref()));
    let store = OutputStore::new(RunPaths::new(Path::new(&args.output_dir), &run));
    let run_dir = &store.paths().run_dir;
    info!(run_id = %run, run_dir = %run_dir.display(), dry_run = args.dry_run, "Run initialised");

    if !args.dry_run {
        if let Err(e) = ensure_writable_dir(run_dir).await {
            error!(
                path = %run_dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Scrape ----
    let service = AcquisitionService::from_config(&config)?;
    info!(chain = ?service.chain().names(), max_attempts = config.max_attempts, "Acquisition pipeline ready");
    let options = RunOptions {
        dry_run: args.dry_run,
        workers: config.workers,
    };

    let report = process_articles(&service, &store, urls, &options).await?;

    for outcome in &report.outcomes {
        if let ArticleOutcome::Failed { url, reason } = outcome {
            warn!(%url, %reason, "Article omitted from output");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total = report.total,
        skipped = report.skipped,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Execution complete"
    );

    Ok(())
}
