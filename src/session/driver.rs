// src/session/driver.rs

//! One isolated browser session per scrape.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thirtyfour::{By, DesiredCapabilities, WebDriver, WebElement};

use crate::error::{Result, ScrapeError};
use crate::models::{Config, DriverConfig, Site};
use crate::session::chromedriver::ChromeDriverProcess;
use crate::session::locator;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A browser session bound to its own chromedriver process.
///
/// The session owns both ends: dropping it without [`close`](Self::close)
/// still kills the chromedriver child, but `close` is the orderly path that
/// also ends the browser session first.
pub struct SessionDriver {
    driver: WebDriver,
    process: ChromeDriverProcess,
    config: Arc<Config>,
    site: Site,
}

impl SessionDriver {
    /// Launch chromedriver and open a fresh browser session for one portal.
    pub async fn open(config: Arc<Config>, site: Site) -> Result<Self> {
        let mut process = ChromeDriverProcess::launch(&config.driver).await?;

        let mut caps = DesiredCapabilities::chrome();
        let mut args: Vec<String> = Vec::new();
        if config.driver.headless {
            args.push("--headless=new".into());
        }
        args.push("--no-sandbox".into());
        args.push("--disable-dev-shm-usage".into());
        args.push("--disable-gpu".into());
        args.push(format!("--window-size={}", config.driver.window_size));
        // Portals are text-only for our purposes, skip image loading.
        args.push("--blink-settings=imagesEnabled=false".into());
        args.push(format!("--user-agent={}", config.driver.user_agent));
        let profile = profile_dir(&config.driver, site);
        match std::fs::create_dir_all(&profile) {
            Ok(()) => args.push(format!("--user-data-dir={}", profile.display())),
            Err(e) => log::warn!("Profile dir {profile:?} unavailable: {e}"),
        }
        if let Err(e) = caps.add_chrome_option("args", args) {
            process.shutdown().await;
            return Err(e.into());
        }

        let driver = match WebDriver::new(&process.server_url(), caps).await {
            Ok(driver) => driver,
            Err(e) => {
                process.shutdown().await;
                return Err(e.into());
            }
        };
        log::debug!("Browser session ready for {}", site.tag());

        Ok(Self {
            driver,
            process,
            config,
            site,
        })
    }

    /// Load a page, bounded by the configured wait timeout.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        log::debug!("[{}] goto {url}", self.site.tag());
        match tokio::time::timeout(self.wait_timeout(), self.driver.goto(url)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: self.config.driver.wait_timeout_secs,
            }),
        }
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    pub async fn source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    /// Poll until the current URL contains `marker`. Returns false on
    /// deadline instead of erroring, so callers can branch.
    pub async fn wait_for_url_contains(&self, marker: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.current_url().await?.contains(marker) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll until the page source contains any of `markers` (case
    /// sensitive). Returns false on deadline.
    pub async fn wait_for_source_any(&self, markers: &[&str], timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let source = self.source().await?;
            if markers.iter().any(|marker| source.contains(marker)) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Fixed pause after form submissions, long enough for the SSO redirect
    /// chain to land.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.driver.settle_delay_ms)).await;
    }

    pub async fn find_first(&self, candidates: &[By]) -> Result<WebElement> {
        locator::find_first(&self.driver, candidates).await
    }

    pub async fn collect_all(&self, candidates: &[By]) -> Vec<WebElement> {
        locator::collect_all(&self.driver, candidates).await
    }

    pub async fn wait_for_first(&self, candidates: &[By]) -> Result<WebElement> {
        locator::wait_for_first(&self.driver, candidates, self.wait_timeout()).await
    }

    /// Write a screenshot and the page source for post-mortem inspection.
    /// Best effort only, failures are logged and swallowed.
    pub async fn dump_diagnostics(&self, tag: &str) {
        if !self.config.diagnostics.enabled {
            return;
        }
        let dir = PathBuf::from(&self.config.diagnostics.debug_dir);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            log::warn!("Cannot create diagnostics dir {dir:?}: {e}");
            return;
        }
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let screenshot = dir.join(format!("{tag}_{stamp}.png"));
        if let Err(e) = self.driver.screenshot(&screenshot).await {
            log::warn!("Screenshot failed: {e}");
        }
        match self.driver.source().await {
            Ok(source) => {
                let page = dir.join(format!("{tag}_{stamp}.html"));
                if let Err(e) = tokio::fs::write(&page, source).await {
                    log::warn!("Page dump failed: {e}");
                }
            }
            Err(e) => log::warn!("Page source unavailable for diagnostics: {e}"),
        }
        log::info!("Diagnostics for '{tag}' written to {dir:?}");
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.config.driver.wait_timeout_secs)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn site(&self) -> Site {
        self.site
    }

    /// End the browser session and stop its chromedriver.
    pub async fn close(self) {
        let SessionDriver {
            driver,
            mut process,
            site,
            ..
        } = self;
        if let Err(e) = driver.quit().await {
            log::warn!("WebDriver quit failed: {e}");
        }
        process.shutdown().await;
        log::debug!("Closed {} session", site.tag());
    }
}

fn profile_dir(config: &DriverConfig, site: Site) -> PathBuf {
    let base = match &config.profile_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir().join("unifetch-profiles"),
    };
    base.join(site.tag())
}
