//! Helpers for run naming, input parsing and file system checks.

use chrono::{DateTime, Local};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

static UNSAFE_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// Name of a run directory: the local start time, optionally suffixed by a batch name.
///
/// # Examples
///
/// ```ignore
/// run_id(now, None)            // "2025-05-06_14-30-00"
/// run_id(now, Some("nightly")) // "2025-05-06_14-30-00_nightly"
/// ```
pub fn run_id(started: DateTime<Local>, batch: Option<&str>) -> String {
    let stamp = started.format("%Y-%m-%d_%H-%M-%S").to_string();
    match batch.map(str::trim).filter(|b| !b.is_empty()) {
        Some(batch) => format!("{stamp}_{}", article_id(batch)),
        None => stamp,
    }
}

/// Filesystem-safe identifier for an article URL.
///
/// Every run of characters outside `[A-Za-z0-9._-]` becomes a single `_`.
pub fn article_id(url: &str) -> String {
    UNSAFE_ID_CHARS.replace_all(url.trim(), "_").into_owned()
}

/// Parse a newline-delimited URL list.
///
/// Lines are trimmed; blank lines, duplicates and unparseable URLs are dropped
/// (the latter with a warning). Order of first appearance is kept.
pub fn parse_url_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| match Url::parse(line) {
            Ok(_) => true,
            Err(e) => {
                warn!(url = %line, error = %e, "Skipping invalid URL");
                false
            }
        })
        .unique()
        .map(str::to_string)
        .collect()
}

/// Read a URL list file.
#[instrument(level = "info")]
pub async fn read_url_file(path: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let urls = parse_url_list(text.lines());
    info!(count = urls.len(), "Read URL list");
    Ok(urls)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a char boundary) with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
