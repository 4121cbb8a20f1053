//! Runtime configuration for the acquisition pipeline.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Once the pipeline is built the configuration is
//! never mutated.
//!
//! ```yaml
//! user_agent: "Mozilla/5.0 ..."
//! max_attempts: 3
//! strategies: [archive, render, direct]
//! backoff:
//!   base_ms: 1000
//!   max_ms: 30000
//!   jitter_ms: 250
//! render:
//!   settle_ms: 2000
//!   timeout_secs: 30
//! cache_capacity: 128
//! workers: 8
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// Browser-like user agent sent by every downloader.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 5.1; rv:40.0) Gecko/20100101 Firefox/40.0";

/// Wayback Machine availability endpoint.
pub const WAYBACK_AVAILABLE_URL: &str = "http://archive.org/wayback/available";

/// Downloaders that can appear in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Closest Wayback Machine snapshot.
    Archive,
    /// Headless Chromium rendering.
    Render,
    /// Plain HTTP GET.
    Direct,
}

impl StrategyKind {
    pub const fn name(self) -> &'static str {
        match self {
            StrategyKind::Archive => "archive",
            StrategyKind::Render => "render",
            StrategyKind::Direct => "direct",
        }
    }
}

/// Backoff applied between retries of a single downloader.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub max_ms: u64,
    pub jitter_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            max_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Availability API queried for the closest snapshot.
    pub endpoint: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            endpoint: WAYBACK_AVAILABLE_URL.to_string(),
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Explicit Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
    /// Base wait after navigation, multiplied by `attempt + 1`.
    pub settle_ms: u64,
    /// Navigation timeout.
    pub timeout_secs: u64,
    pub headless: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            settle_ms: 2000,
            timeout_secs: 30,
            headless: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Attempts per downloader, including the first one.
    pub max_attempts: u32,
    pub backoff: BackoffConfig,
    /// Fallback order.
    pub strategies: Vec<StrategyKind>,
    pub archive: ArchiveConfig,
    pub render: RenderConfig,
    /// Entries kept by the in-memory resource cache; `0` disables it.
    pub cache_capacity: usize,
    /// Concurrent acquisitions in a batch.
    pub workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            backoff: BackoffConfig::default(),
            strategies: vec![
                StrategyKind::Archive,
                StrategyKind::Render,
                StrategyKind::Direct,
            ],
            archive: ArchiveConfig::default(),
            render: RenderConfig::default(),
            cache_capacity: 128,
            workers: 8,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse a YAML document; missing keys fall back to their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// Load the configuration file, or the defaults when no path is given.
///
/// # Arguments
///
/// * `path` - Optional path to a YAML file; keys it omits keep their defaults
///
/// # Returns
///
/// The parsed [`FetchConfig`], or an error if the file cannot be read or is
/// not valid YAML for this schema.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<FetchConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let yaml = tokio::fs::read_to_string(path).await?;
            let config = FetchConfig::from_yaml(&yaml)?;
            info!(path, "Loaded configuration");
            Ok(config)
        }
        None => Ok(FetchConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, USER_AGENT);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(
            config.strategies,
            vec![
                StrategyKind::Archive,
                StrategyKind::Render,
                StrategyKind::Direct
            ]
        );
        assert_eq!(config.archive.endpoint, WAYBACK_AVAILABLE_URL);
        assert!(config.render.headless);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
max_attempts: 5
strategies: [direct, archive]
backoff:
  base_ms: 10
render:
  settle_ms: 500
"#;
        let config = FetchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(
            config.strategies,
            vec![StrategyKind::Direct, StrategyKind::Archive]
        );
        assert_eq!(config.backoff.base_ms, 10);
        assert_eq!(config.backoff.max_ms, 30_000);
        assert_eq!(config.render.settle_ms, 500);
        assert_eq!(config.render.timeout_secs, 30);
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let yaml = "strategies: [archive, carrier_pigeon]";
        assert!(FetchConfig::from_yaml(yaml).is_err());
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "workers: 2\ncache_capacity: 0\n").unwrap();

        let config = load_config(path.to_str()).await.unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.cache_capacity, 0);
    }

    #[tokio::test]
    async fn test_load_config_without_path_uses_defaults() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config.workers, 8);
    }
}
