//! Command-line interface definitions.
//!
//! Flags given here override the matching keys of the optional YAML
//! configuration file.

use crate::config::{FetchConfig, StrategyKind};
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # A couple of URLs
/// article_fetch -u https://example.com/a https://example.com/b
///
/// # A URL list, skipping the headless browser
/// article_fetch -f urls.txt --strategies archive,direct
///
/// # Resume an earlier run
/// article_fetch -f urls.txt --run-id 2025-05-06_14-30-00
///
/// # Exercise the pipeline without writing anything
/// article_fetch -f urls.txt --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URLs of articles to scrape
    #[arg(short = 'u', long = "url", num_args = 1.., required_unless_present = "file")]
    pub urls: Vec<String>,

    /// File containing URLs of articles to scrape, one per line
    #[arg(short, long, conflicts_with = "urls")]
    pub file: Option<String>,

    /// Root directory for run outputs
    #[arg(short, long, default_value = "results")]
    pub output_dir: String,

    /// Reuse an existing run directory; URLs already recorded there are skipped
    #[arg(long)]
    pub run_id: Option<String>,

    /// Suffix appended to a newly generated run id
    #[arg(short, long)]
    pub batch: Option<String>,

    /// Run the whole pipeline but write no files
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum concurrent acquisitions
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Attempts per downloader before falling through
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Downloader order, e.g. `archive,render,direct`
    #[arg(long, value_enum, value_delimiter = ',')]
    pub strategies: Option<Vec<StrategyKind>>,

    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// User agent sent with every request
    #[arg(long, env = "ARTICLE_FETCH_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut FetchConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(strategies) = &self.strategies {
            config.strategies = strategies.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_urls() {
        let cli = Cli::parse_from([
            "article_fetch",
            "--url",
            "https://a.com/1",
            "https://b.com/2",
        ]);

        assert_eq!(cli.urls, vec!["https://a.com/1", "https://b.com/2"]);
        assert_eq!(cli.output_dir, "results");
        assert!(!cli.dry_run);
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "article_fetch",
            "-f",
            "urls.txt",
            "-o",
            "/tmp/out",
            "-b",
            "nightly",
            "-w",
            "3",
        ]);

        assert_eq!(cli.file.as_deref(), Some("urls.txt"));
        assert_eq!(cli.output_dir, "/tmp/out");
        assert_eq!(cli.batch.as_deref(), Some("nightly"));
        assert_eq!(cli.workers, Some(3));
    }

    #[test]
    fn test_cli_requires_an_input() {
        assert!(Cli::try_parse_from(["article_fetch"]).is_err());
        assert!(
            Cli::try_parse_from(["article_fetch", "-u", "https://a.com", "-f", "urls.txt"])
                .is_err()
        );
    }

    #[test]
    fn test_strategy_list_and_overrides() {
        let cli = Cli::parse_from([
            "article_fetch",
            "-f",
            "urls.txt",
            "--strategies",
            "direct,archive",
            "--max-attempts",
            "5",
            "--user-agent",
            "custom",
            "--dry-run",
        ]);
        assert!(cli.dry_run);

        let mut config = FetchConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(
            config.strategies,
            vec![StrategyKind::Direct, StrategyKind::Archive]
        );
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.user_agent, "custom");
        assert_eq!(config.workers, 8);
    }
}
