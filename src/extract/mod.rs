// src/extract/mod.rs

//! Pure HTML extraction heuristics.
//!
//! Everything in here works on page source strings and is deterministic,
//! which keeps the heuristics testable without a browser.

pub mod courses;
pub mod dates;
pub mod deadlines;
pub mod grades;

use scraper::{ElementRef, Selector};

use crate::utils::text::normalize_whitespace;

/// Parse a CSS selector known at compile time.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Whitespace-normalized text content of an element subtree.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
