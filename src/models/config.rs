//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Browser and chromedriver settings
    #[serde(default)]
    pub driver: DriverConfig,

    /// Portal entry points and identity provider markers
    #[serde(default)]
    pub portals: PortalConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Failure diagnostics settings
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.driver.user_agent.trim().is_empty() {
            return Err(ScrapeError::config("driver.user_agent is empty"));
        }
        if self.driver.wait_timeout_secs == 0 {
            return Err(ScrapeError::config("driver.wait_timeout_secs must be > 0"));
        }
        if self.driver.startup_timeout_secs == 0 {
            return Err(ScrapeError::config(
                "driver.startup_timeout_secs must be > 0",
            ));
        }
        if parse_window_size(&self.driver.window_size).is_none() {
            return Err(ScrapeError::config(
                "driver.window_size must be WIDTH,HEIGHT (e.g. 1280,720)",
            ));
        }
        for (name, url) in [
            ("portals.exam_url", &self.portals.exam_url),
            ("portals.moodle_login_url", &self.portals.moodle_login_url),
            (
                "portals.moodle_dashboard_url",
                &self.portals.moodle_dashboard_url,
            ),
            ("portals.lsf_lectures_url", &self.portals.lsf_lectures_url),
        ] {
            if url::Url::parse(url).is_err() {
                return Err(ScrapeError::config(format!("{name} is not a valid URL")));
            }
        }
        if self.portals.sso_marker.trim().is_empty() {
            return Err(ScrapeError::config("portals.sso_marker is empty"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ScrapeError::config("cache.ttl_secs must be > 0"));
        }
        if self.cache.max_entries == 0 {
            return Err(ScrapeError::config("cache.max_entries must be > 0"));
        }
        Ok(())
    }
}

/// Parse a "WIDTH,HEIGHT" string into a pair of pixel sizes.
pub fn parse_window_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(',')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Browser and chromedriver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Path to the chromedriver binary. Falls back to the CHROMEDRIVER
    /// environment variable, then to a PATH lookup.
    #[serde(default)]
    pub chromedriver_path: Option<String>,

    /// User-Agent string presented by the browser
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Browser window size as "WIDTH,HEIGHT"
    #[serde(default = "defaults::window_size")]
    pub window_size: String,

    /// Run the browser without a visible window
    #[serde(default = "defaults::headless")]
    pub headless: bool,

    /// Deadline for page loads and element waits, in seconds
    #[serde(default = "defaults::wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Pause after form submissions to let redirects land, in milliseconds
    #[serde(default = "defaults::settle_delay")]
    pub settle_delay_ms: u64,

    /// Deadline for chromedriver to accept connections, in seconds
    #[serde(default = "defaults::startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Base directory for per-portal browser profiles. Defaults to a
    /// subdirectory of the system temp dir.
    #[serde(default)]
    pub profile_dir: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chromedriver_path: None,
            user_agent: defaults::user_agent(),
            window_size: defaults::window_size(),
            headless: defaults::headless(),
            wait_timeout_secs: defaults::wait_timeout(),
            settle_delay_ms: defaults::settle_delay(),
            startup_timeout_secs: defaults::startup_timeout(),
            profile_dir: None,
        }
    }
}

/// Portal entry points and identity provider markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Exam records portal entry page
    #[serde(default = "defaults::exam_url")]
    pub exam_url: String,

    /// Moodle login page
    #[serde(default = "defaults::moodle_login_url")]
    pub moodle_login_url: String,

    /// Moodle dashboard with the deadline timeline
    #[serde(default = "defaults::moodle_dashboard_url")]
    pub moodle_dashboard_url: String,

    /// Deep link into the LSF lecture overview
    #[serde(default = "defaults::lsf_lectures_url")]
    pub lsf_lectures_url: String,

    /// URL substring identifying the SSO identity provider
    #[serde(default = "defaults::sso_marker")]
    pub sso_marker: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            exam_url: defaults::exam_url(),
            moodle_login_url: defaults::moodle_login_url(),
            moodle_dashboard_url: defaults::moodle_dashboard_url(),
            lsf_lectures_url: defaults::lsf_lectures_url(),
            sso_marker: defaults::sso_marker(),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long cached results stay fresh, in seconds
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,

    /// Maximum number of cached entries per cache
    #[serde(default = "defaults::cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::cache_ttl(),
            max_entries: defaults::cache_max_entries(),
        }
    }
}

/// Failure diagnostics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Write a screenshot and page source on scrape failures
    #[serde(default = "defaults::diagnostics_enabled")]
    pub enabled: bool,

    /// Directory for diagnostic dumps
    #[serde(default = "defaults::debug_dir")]
    pub debug_dir: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::diagnostics_enabled(),
            debug_dir: defaults::debug_dir(),
        }
    }
}

mod defaults {
    // Driver defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn window_size() -> String {
        "1280,720".into()
    }
    pub fn headless() -> bool {
        true
    }
    pub fn wait_timeout() -> u64 {
        10
    }
    pub fn settle_delay() -> u64 {
        3000
    }
    pub fn startup_timeout() -> u64 {
        15
    }

    // Portal defaults
    pub fn exam_url() -> String {
        "https://www.boss.tu-dortmund.de/".into()
    }
    pub fn moodle_login_url() -> String {
        "https://moodle.tu-dortmund.de/login/index.php".into()
    }
    pub fn moodle_dashboard_url() -> String {
        "https://moodle.tu-dortmund.de/my/".into()
    }
    pub fn lsf_lectures_url() -> String {
        "https://www.lsf.tu-dortmund.de/qisserver/rds?state=wscheck&wscheck=leistungen\
         &navigationPosition=functions%2CmyLecturesWScheck&breadcrumb=myLectures\
         &topitem=functions&subitem=myLecturesWScheck"
            .into()
    }
    pub fn sso_marker() -> String {
        "sso.itmc".into()
    }

    // Cache defaults
    pub fn cache_ttl() -> u64 {
        86_400
    }
    pub fn cache_max_entries() -> usize {
        500
    }

    // Diagnostics defaults
    pub fn diagnostics_enabled() -> bool {
        true
    }
    pub fn debug_dir() -> String {
        "debug".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.driver.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_wait_timeout() {
        let mut config = Config::default();
        config.driver.wait_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_window_size() {
        let mut config = Config::default();
        config.driver.window_size = "1280x720".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cache_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unparseable_portal_url() {
        let mut config = Config::default();
        config.portals.exam_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_missing_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [driver]
            headless = false
            wait_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert!(!config.driver.headless);
        assert_eq!(config.driver.wait_timeout_secs, 5);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert!(config.portals.exam_url.contains("boss.tu-dortmund.de"));
    }

    #[test]
    fn load_reads_a_toml_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [cache]
            ttl_secs = 120

            [diagnostics]
            enabled = false
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.cache.ttl_secs, 120);
        assert!(!config.diagnostics.enabled);
        // Untouched sections keep their defaults.
        assert!(config.driver.headless);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "driver = not toml").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn load_or_default_survives_a_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("nope.toml"));
        assert_eq!(config.cache.ttl_secs, 86_400);
    }

    #[test]
    fn window_size_parses_into_pixel_pair() {
        assert_eq!(parse_window_size("1280,720"), Some((1280, 720)));
        assert_eq!(parse_window_size(" 1920 , 1080 "), Some((1920, 1080)));
        assert_eq!(parse_window_size("1280"), None);
        assert_eq!(parse_window_size("wide,short"), None);
    }
}
