//! Headless Chromium downloader.
//!
//! Every attempt launches its own browser process on its own throwaway
//! profile directory, so concurrent acquisitions never share a session or
//! contend for Chromium's profile lock. The process and the profile are
//! owned by a [`RenderSession`] guard: the browser is closed explicitly on
//! the normal paths and killed when the guard is dropped, which also covers
//! a caller abandoning the `acquire` future mid-flight. The profile
//! directory is removed on every path.
//!
//! Pages are given `settle_ms * (attempt + 1)` after navigation for
//! scripts to finish, so later retries wait longer for dynamic content.

use super::Strategy;
use crate::acquisition::AcquisitionError;
use crate::config::{RenderConfig, StrategyKind};
use crate::models::Resource;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

const NAME: &str = StrategyKind::Render.name();

#[derive(Debug, Clone)]
pub struct RenderDownloader {
    config: RenderConfig,
    user_agent: String,
}

impl RenderDownloader {
    pub fn new(config: RenderConfig, user_agent: String) -> Self {
        Self { config, user_agent }
    }

    /// Time given to the page after navigation on the given attempt.
    fn settle_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.settle_ms).saturating_mul(attempt.saturating_add(1))
    }

    /// Fresh profile directory for one browser process.
    fn new_profile() -> Result<TempDir, AcquisitionError> {
        tempfile::Builder::new()
            .prefix("article_fetch-render-")
            .tempdir()
            .map_err(|e| {
                AcquisitionError::transient(NAME, format!("Could not create browser profile: {e}"))
            })
    }

    fn browser_config(&self, profile: &Path) -> Result<BrowserConfig, AcquisitionError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", self.user_agent));

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| {
            AcquisitionError::transient(NAME, format!("Invalid browser configuration: {e}"))
        })
    }
}

impl Strategy for RenderDownloader {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(level = "info", skip(self), fields(strategy = NAME))]
    async fn attempt(&self, url: &str, attempt: u32) -> Result<Resource, AcquisitionError> {
        let profile = Self::new_profile()?;
        let config = self.browser_config(profile.path())?;
        debug!(profile = %profile.path().display(), "Launching browser");
        let session = RenderSession::launch(config, profile).await?;
        let navigation_timeout = Duration::from_secs(self.config.timeout_secs);

        let rendered = session
            .render(url, navigation_timeout, self.settle_delay(attempt))
            .await;
        session.close().await;

        let (resolved_url, html) = rendered?;
        debug!(%resolved_url, bytes = html.len(), "Rendered page captured");
        Ok(Resource::new(resolved_url, html, NAME))
    }
}

/// A running browser process, the task pumping its CDP events, and the
/// profile directory the process writes to.
///
/// Fields drop in declaration order after [`Drop::drop`] has run, so the
/// profile is removed only once the browser is gone.
struct RenderSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile: TempDir,
}

impl RenderSession {
    fn new(browser: Option<Browser>, handler: JoinHandle<()>, profile: TempDir) -> Self {
        Self {
            browser,
            handler,
            profile,
        }
    }

    async fn launch(config: BrowserConfig, profile: TempDir) -> Result<Self, AcquisitionError> {
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            warn!(error = %e, "Failed to launch browser");
            AcquisitionError::transient(NAME, format!("Could not launch browser: {e}"))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self::new(Some(browser), handler, profile))
    }

    /// Navigate to `url`, let it settle, and return the final URL and markup.
    async fn render(
        &self,
        url: &str,
        navigation_timeout: Duration,
        settle: Duration,
    ) -> Result<(String, String), AcquisitionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AcquisitionError::transient(NAME, "Browser session already closed"))?;

        let page = match timeout(navigation_timeout, browser.new_page(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                return Err(AcquisitionError::transient(
                    NAME,
                    format!("Navigation to {url} failed: {e}"),
                ));
            }
            Err(_) => {
                return Err(AcquisitionError::transient(
                    NAME,
                    format!("Navigation to {url} timed out after {navigation_timeout:?}"),
                ));
            }
        };

        sleep(settle).await;

        let html = page.content().await.map_err(|e| {
            AcquisitionError::transient(NAME, format!("Could not capture markup of {url}: {e}"))
        })?;
        let resolved_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok((resolved_url, html))
    }

    /// Graceful shutdown; the drop guard handles every other exit path.
    async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "Failed waiting for browser process");
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        // Dropping the Browser kills a process that was not closed above.
        if self.browser.take().is_some() {
            debug!(
                profile = %self.profile.path().display(),
                "Render session dropped before close; killing browser"
            );
        }
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::FailureKind;
    use std::path::PathBuf;
    use tokio::sync::oneshot;

    fn downloader(chrome: Option<PathBuf>) -> RenderDownloader {
        RenderDownloader::new(
            RenderConfig {
                chrome_executable: chrome,
                settle_ms: 250,
                timeout_secs: 5,
                headless: true,
            },
            "test-agent".to_string(),
        )
    }

    #[test]
    fn test_settle_delay_grows_with_attempt() {
        let d = downloader(None);
        assert_eq!(d.settle_delay(0), Duration::from_millis(250));
        assert_eq!(d.settle_delay(1), Duration::from_millis(500));
        assert_eq!(d.settle_delay(3), Duration::from_millis(1000));
    }

    #[test]
    fn test_each_session_gets_its_own_profile() {
        let d = downloader(Some(PathBuf::from("/bin/true")));
        let a = RenderDownloader::new_profile().unwrap();
        let b = RenderDownloader::new_profile().unwrap();
        assert_ne!(a.path(), b.path());

        let config_a = format!("{:?}", d.browser_config(a.path()).unwrap());
        let config_b = format!("{:?}", d.browser_config(b.path()).unwrap());
        let path_a = a.path().to_str().unwrap();
        let path_b = b.path().to_str().unwrap();

        assert!(config_a.contains(path_a));
        assert!(!config_a.contains(path_b));
        assert!(config_b.contains(path_b));
    }

    /// Handler stand-in that reports when its task is torn down.
    fn pending_handler() -> (JoinHandle<()>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        (handle, rx)
    }

    #[tokio::test]
    async fn test_dropped_session_aborts_handler_and_removes_profile() {
        let profile = RenderDownloader::new_profile().unwrap();
        let profile_path = profile.path().to_path_buf();
        let (handler, torn_down) = pending_handler();

        let session = RenderSession::new(None, handler, profile);
        assert!(profile_path.exists());
        drop(session);

        let outcome = tokio::time::timeout(Duration::from_secs(1), torn_down).await;
        assert!(matches!(outcome, Ok(Err(_))), "handler task should be aborted");
        assert!(!profile_path.exists());
    }

    #[tokio::test]
    async fn test_closed_session_removes_profile() {
        let profile = RenderDownloader::new_profile().unwrap();
        let profile_path = profile.path().to_path_buf();
        let (handler, torn_down) = pending_handler();

        RenderSession::new(None, handler, profile).close().await;

        let outcome = tokio::time::timeout(Duration::from_secs(1), torn_down).await;
        assert!(matches!(outcome, Ok(Err(_))));
        assert!(!profile_path.exists());
    }

    #[tokio::test]
    async fn test_launch_failure_is_transient() {
        let d = downloader(Some(PathBuf::from("/nonexistent/chromium-binary")));
        let err = d.attempt("https://example.com", 0).await.unwrap_err();

        assert_eq!(err.kind, FailureKind::Transient);
        assert_eq!(err.strategy, "render");
    }
}
