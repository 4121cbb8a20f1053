//! Plain HTTP downloader, the last resort of the chain.
//!
//! Only transport-level failures are errors. Whatever body the server
//! returns, including error pages, is handed back as content.

use super::Strategy;
use crate::acquisition::AcquisitionError;
use crate::config::StrategyKind;
use crate::models::Resource;
use reqwest::Client;
use tracing::{debug, instrument, warn};

const NAME: &str = StrategyKind::Direct.name();

#[derive(Debug, Clone)]
pub struct DirectDownloader {
    client: Client,
}

impl DirectDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Strategy for DirectDownloader {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(level = "info", skip(self), fields(strategy = NAME))]
    async fn attempt(&self, url: &str, _attempt: u32) -> Result<Resource, AcquisitionError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Direct fetch failed");
            AcquisitionError::transient(NAME, format!("Could not fetch {url}: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AcquisitionError::transient(NAME, format!("Could not read body of {url}: {e}"))
        })?;

        debug!(%status, bytes = body.len(), "Direct fetch complete");
        Ok(Resource::new(url, body, NAME))
    }
}
