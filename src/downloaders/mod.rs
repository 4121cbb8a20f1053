//! Downloaders: the individual acquisition strategies.
//!
//! Each downloader implements [`Strategy`] and is tried by the fallback
//! chain in the configured order:
//!
//! | Downloader | Module | Source | Failure classification |
//! |------------|--------|--------|------------------------|
//! | `archive` | [`archive`] | Wayback Machine availability API | no snapshot is definitive, transport errors are transient |
//! | `render` | [`render`] | Headless Chromium | every failure is transient |
//! | `direct` | [`direct`] | Plain HTTP GET | transport errors are transient, any HTTP status is content |
//!
//! Downloaders keep no state between calls. The HTTP client they share is
//! reference counted and read-only.

pub mod archive;
pub mod direct;
pub mod render;

use crate::acquisition::AcquisitionError;
use crate::config::{FetchConfig, StrategyKind};
use crate::models::Resource;
use reqwest::Client;

pub use archive::ArchiveDownloader;
pub use direct::DirectDownloader;
pub use render::RenderDownloader;

/// A single acquisition method.
pub trait Strategy {
    /// Stable name reported in [`Resource::strategy`] and in errors.
    fn name(&self) -> &str;

    /// Try to fetch `url`. `attempt` starts at 0 and grows with each retry.
    async fn attempt(&self, url: &str, attempt: u32) -> Result<Resource, AcquisitionError>;
}

/// The shipped downloaders, dispatched statically.
#[derive(Debug)]
pub enum Downloader {
    Archive(ArchiveDownloader),
    Render(RenderDownloader),
    Direct(DirectDownloader),
}

impl Strategy for Downloader {
    fn name(&self) -> &str {
        match self {
            Downloader::Archive(d) => d.name(),
            Downloader::Render(d) => d.name(),
            Downloader::Direct(d) => d.name(),
        }
    }

    async fn attempt(&self, url: &str, attempt: u32) -> Result<Resource, AcquisitionError> {
        match self {
            Downloader::Archive(d) => d.attempt(url, attempt).await,
            Downloader::Render(d) => d.attempt(url, attempt).await,
            Downloader::Direct(d) => d.attempt(url, attempt).await,
        }
    }
}

/// Build the HTTP client shared by the network downloaders.
pub fn http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .build()
}

/// Instantiate the downloaders named in `config.strategies`, in order.
pub fn from_config(config: &FetchConfig) -> Result<Vec<Downloader>, reqwest::Error> {
    let client = http_client(config)?;
    let downloaders = config
        .strategies
        .iter()
        .map(|kind| match kind {
            StrategyKind::Archive => Downloader::Archive(ArchiveDownloader::new(
                client.clone(),
                config.archive.endpoint.clone(),
            )),
            StrategyKind::Render => Downloader::Render(RenderDownloader::new(
                config.render.clone(),
                config.user_agent.clone(),
            )),
            StrategyKind::Direct => Downloader::Direct(DirectDownloader::new(client.clone())),
        })
        .collect();

    Ok(downloaders)
}
