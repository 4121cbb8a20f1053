//! Run outputs: the results table and per-article artifacts.
//!
//! # Submodules
//!
//! - [`csv`]: reading and appending `results.csv`
//! - [`markdown`]: per-article Markdown rendering
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06_14-30-00[_batch]/
//!     ├── results.csv          # append-only, one row per article
//!     ├── md/<id>.md           # rendered text
//!     └── html/<id>.html       # cleaned markup
//! ```
//!
//! Re-running with the same run id resumes: URLs already present in
//! `results.csv` are skipped.

pub mod csv;
pub mod markdown;

use crate::models::ArticleRecord;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// File locations for one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub run_dir: PathBuf,
    pub results_csv: PathBuf,
    pub markdown_dir: PathBuf,
    pub html_dir: PathBuf,
}

impl RunPaths {
    pub fn new(output_dir: &Path, run_id: &str) -> Self {
        let run_dir = output_dir.join(run_id);
        Self {
            results_csv: run_dir.join("results.csv"),
            markdown_dir: run_dir.join("md"),
            html_dir: run_dir.join("html"),
            run_dir,
        }
    }

    pub fn markdown_file(&self, id: &str) -> PathBuf {
        self.markdown_dir.join(format!("{id}.md"))
    }

    pub fn html_file(&self, id: &str) -> PathBuf {
        self.html_dir.join(format!("{id}.html"))
    }
}

/// Writer for a run's outputs.
///
/// Appends to `results.csv` are serialised so rows from concurrent
/// articles never interleave.
#[derive(Debug)]
pub struct OutputStore {
    paths: RunPaths,
    csv_lock: Mutex<()>,
}

impl OutputStore {
    pub fn new(paths: RunPaths) -> Self {
        Self {
            paths,
            csv_lock: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    /// URLs already recorded by an earlier invocation of this run.
    #[instrument(level = "info", skip_all, fields(path = %self.paths.results_csv.display()))]
    pub async fn completed_urls(&self) -> Result<HashSet<String>, Box<dyn Error>> {
        let text = match fs::read_to_string(&self.paths.results_csv).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let done: HashSet<String> = csv::column_values(&text, "url").into_iter().collect();
        info!(count = done.len(), "Found previously scraped URLs");
        Ok(done)
    }

    /// Write the Markdown and HTML artifacts, then append the CSV row.
    ///
    /// The row goes last so a crash mid-article leaves it eligible for resume.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn persist(&self, article: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.paths.markdown_dir).await?;
        fs::create_dir_all(&self.paths.html_dir).await?;

        let md_path = self.paths.markdown_file(&article.id);
        fs::write(&md_path, markdown::article_to_markdown(article)).await?;

        let html_path = self.paths.html_file(&article.id);
        fs::write(&html_path, &article.html).await?;

        self.append_row(article).await?;
        debug!(md = %md_path.display(), html = %html_path.display(), "Article persisted");
        Ok(())
    }

    async fn append_row(&self, article: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        let _guard = self.csv_lock.lock().await;

        let write_header = !fs::try_exists(&self.paths.results_csv).await?;
        let mut buf = String::new();
        if write_header {
            buf.push_str(&csv::row_to_string(&ArticleRecord::CSV_HEADER));
        }
        buf.push_str(&csv::row_to_string(&article.csv_row()));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.paths.results_csv)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
