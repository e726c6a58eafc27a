// src/utils/text.rs

//! Text helpers shared by the extraction heuristics.

/// Collapse all whitespace runs into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a decimal number that may use a German comma separator.
///
/// Returns `None` for empty or non-numeric input.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned = s.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Case-insensitive substring check against a set of markers.
pub fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    markers.iter().any(|marker| lower.contains(marker))
}

/// Round to two decimal places, for grade averages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
