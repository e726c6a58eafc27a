// src/error.rs

//! Unified error handling for the portal fetcher.

use thiserror::Error;

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// chromedriver could not be located or started
    #[error("driver launch failed: {0}")]
    DriverLaunch(String),

    /// WebDriver protocol call failed
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// Page navigation exceeded the configured deadline
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    /// Login flow never reached a terminal state
    #[error("login did not complete before the deadline")]
    LoginTimeout,

    /// No candidate locator matched a visible element
    #[error("element not found, tried: {0}")]
    ElementNotFound(String),

    /// The identity provider rejected the supplied credentials
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A second factor was demanded but no TOTP seed is available
    #[error("second factor required but no TOTP seed supplied")]
    SecondFactorRequired,

    /// The portal is in a maintenance window
    #[error("portal is down for maintenance")]
    Maintenance,

    /// One-time code generation failed
    #[error("TOTP error: {0}")]
    Totp(String),

    /// HTTP request failed (driver status probe)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Create a driver launch error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::DriverLaunch(message.into())
    }

    /// Create an element lookup error naming the candidates that were tried.
    pub fn element(candidates: impl Into<String>) -> Self {
        Self::ElementNotFound(candidates.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable failure category reported to callers.
    ///
    /// These strings are part of the result payload and must not change
    /// between releases.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::SecondFactorRequired => "second_factor_required",
            Self::Maintenance => "maintenance",
            Self::NavigationTimeout { .. } | Self::LoginTimeout => "timeout",
            Self::DriverLaunch(_) | Self::Http(_) => "driver_unavailable",
            Self::ElementNotFound(_) => "element_not_found",
            _ => "internal",
        }
    }

    /// Whether retrying the same request unchanged may succeed.
    ///
    /// Credential and second-factor failures are permanent until the caller
    /// supplies different inputs.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. }
                | Self::LoginTimeout
                | Self::DriverLaunch(_)
                | Self::Http(_)
                | Self::Maintenance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_strings_are_stable() {
        assert_eq!(ScrapeError::InvalidCredentials.category(), "invalid_credentials");
        assert_eq!(
            ScrapeError::SecondFactorRequired.category(),
            "second_factor_required"
        );
        assert_eq!(ScrapeError::Maintenance.category(), "maintenance");
        assert_eq!(ScrapeError::LoginTimeout.category(), "timeout");
        assert_eq!(
            ScrapeError::NavigationTimeout {
                url: "https://example.com".into(),
                timeout_secs: 10,
            }
            .category(),
            "timeout"
        );
        assert_eq!(
            ScrapeError::driver("no binary").category(),
            "driver_unavailable"
        );
        assert_eq!(
            ScrapeError::element("#username").category(),
            "element_not_found"
        );
        assert_eq!(ScrapeError::config("bad value").category(), "internal");
    }

    #[test]
    fn credential_failures_are_not_transient() {
        assert!(!ScrapeError::InvalidCredentials.is_transient());
        assert!(!ScrapeError::SecondFactorRequired.is_transient());
        assert!(ScrapeError::LoginTimeout.is_transient());
        assert!(ScrapeError::driver("gone").is_transient());
    }
}
