//! Wayback Machine downloader.
//!
//! Asks the availability API for the closest snapshot of the article and
//! downloads that snapshot instead of the live page.
//!
//! # Response shape
//!
//! ```json
//! {"url": "example.com/a",
//!  "archived_snapshots": {"closest": {"available": true, "status": "200",
//!    "url": "http://web.archive.org/web/20200101000000/https://example.com/a",
//!    "timestamp": "20200101000000"}}}
//! ```
//!
//! An empty `archived_snapshots` object means the archive has nothing for
//! this URL, which retrying will not change.

use super::Strategy;
use crate::acquisition::AcquisitionError;
use crate::config::StrategyKind;
use crate::models::Resource;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

const NAME: &str = StrategyKind::Archive.name();

#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default = "snapshot_available_default")]
    available: bool,
    url: Option<String>,
}

fn snapshot_available_default() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct ArchiveDownloader {
    client: Client,
    endpoint: String,
}

impl ArchiveDownloader {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    fn availability_url(&self, url: &str) -> String {
        format!("{}?url={}", self.endpoint, urlencoding::encode(url))
    }

    /// Look up the closest snapshot URL for `url`.
    async fn snapshot_url(&self, url: &str) -> Result<String, AcquisitionError> {
        let availability_url = self.availability_url(url);

        let response = self
            .client
            .get(&availability_url)
            .send()
            .await
            .map_err(|e| {
                warn!(%availability_url, error = %e, "Availability lookup failed");
                AcquisitionError::transient(
                    NAME,
                    format!("Could not fetch {availability_url}: {e}"),
                )
            })?;

        let body = response.text().await.map_err(|e| {
            AcquisitionError::transient(NAME, format!("Could not read {availability_url}: {e}"))
        })?;

        let availability: Availability = serde_json::from_str(&body).map_err(|e| {
            AcquisitionError::transient(
                NAME,
                format!("Unexpected availability response for {url}: {e}"),
            )
        })?;

        match availability.archived_snapshots.closest {
            Some(Snapshot {
                available: true,
                url: Some(snapshot),
            }) => Ok(snapshot),
            _ => Err(AcquisitionError::definitive(
                NAME,
                format!("Could not find a snapshot for {url} on the Internet Archive."),
            )),
        }
    }
}

impl Strategy for ArchiveDownloader {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(level = "info", skip(self), fields(strategy = NAME))]
    async fn attempt(&self, url: &str, _attempt: u32) -> Result<Resource, AcquisitionError> {
        let snapshot = self.snapshot_url(url).await?;
        info!(%snapshot, "Alternate URL found");

        let body = self
            .client
            .get(&snapshot)
            .send()
            .await
            .map_err(|e| {
                AcquisitionError::transient(NAME, format!("Could not fetch snapshot {snapshot}: {e}"))
            })?
            .text()
            .await
            .map_err(|e| {
                AcquisitionError::transient(NAME, format!("Could not read snapshot {snapshot}: {e}"))
            })?;

        Ok(Resource::new(snapshot, body, NAME))
    }
}
