// src/session/locator.rs

//! Ordered-candidate element lookup.
//!
//! Portal markup shifts between releases and languages, so every lookup
//! runs against an ordered catalogue of locators from most specific to most
//! generic. The first candidate matching a visible element wins.

use std::time::{Duration, Instant};

use thirtyfour::{By, WebDriver, WebElement};

use crate::error::{Result, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Render a catalogue for error messages and logs.
pub fn describe(candidates: &[By]) -> String {
    candidates
        .iter()
        .map(|by| format!("{by:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Single pass over the catalogue, returning the first visible match.
pub async fn find_first(driver: &WebDriver, candidates: &[By]) -> Result<WebElement> {
    for by in candidates {
        if let Ok(element) = driver.find(by.clone()).await {
            if element.is_displayed().await.unwrap_or(false) {
                return Ok(element);
            }
        }
    }
    Err(ScrapeError::element(describe(candidates)))
}

/// Every element matched by any candidate, concatenated in catalogue order.
///
/// Unlike [`find_first`] an empty result is not an error; callers decide
/// whether zero matches is a problem.
pub async fn collect_all(driver: &WebDriver, candidates: &[By]) -> Vec<WebElement> {
    let mut matches = Vec::new();
    for by in candidates {
        if let Ok(elements) = driver.find_all(by.clone()).await {
            matches.extend(elements);
        }
    }
    matches
}

/// Poll the catalogue until a visible match appears or the deadline passes.
pub async fn wait_for_first(
    driver: &WebDriver,
    candidates: &[By],
    timeout: Duration,
) -> Result<WebElement> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(element) = find_first(driver, candidates).await {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::element(describe(candidates)));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
