// src/extract/dates.rs

//! Due-date recovery from free-form timeline text.
//!
//! Moodle renders deadlines in several shapes depending on locale and
//! proximity: explicit dates ("15. Mai 2026", "03.07.2026"), and relative
//! phrases ("morgen", "in 3 Tagen", a bare weekday name). Parsing is two
//! stage: explicit forms win, relative phrases are the fallback. Relative
//! weekdays are biased into the future since past deadlines are not shown
//! on the timeline.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Parse a due date out of surrounding text. Time of day defaults to 23:59.
pub fn parse_due_date(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = parse_explicit(text, now.date()).or_else(|| parse_relative(text, now.date()))?;
    let (hour, minute) = parse_time(text).unwrap_or((23, 59));
    date.and_hms_opt(hour, minute, 0)
}

/// Explicit date forms: "15. Mai 2026" and "03.07.26".
fn parse_explicit(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let month_name = Regex::new(
        r"(?i)(\d{1,2})\.?\s*(jan|feb|mär|mar|apr|mai|may|jun|jul|aug|sep|okt|oct|nov|dez|dec)[a-zä]*\s+(\d{2,4})",
    )
    .ok()?;
    if let Some(caps) = month_name.captures(text) {
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month = month_number(caps.get(2)?.as_str())?;
        let year: i32 = caps.get(3)?.as_str().parse().ok()?;
        if let Some(date) =
            NaiveDate::from_ymd_opt(adjust_century(year, today.year()), month, day)
        {
            return Some(date);
        }
    }

    let numeric = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{2,4})").ok()?;
    let caps = numeric.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(adjust_century(year, today.year()), month, day)
}

/// Relative phrases, German and English.
fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();

    // "übermorgen" first, "morgen" is a substring of it.
    if lower.contains("übermorgen") {
        return Some(today + Duration::days(2));
    }
    if lower.contains("heute") || lower.contains("today") {
        return Some(today);
    }
    if lower.contains("morgen") || lower.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }

    let offset = Regex::new(r"in\s+(\d+)\s+(tagen?|days?|wochen?|weeks?)").ok()?;
    if let Some(caps) = offset.captures(&lower) {
        let count: i64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        let days = if unit.starts_with('w') { count * 7 } else { count };
        return Some(today + Duration::days(days));
    }

    const WEEKDAYS: &[(&str, u32)] = &[
        ("montag", 0),
        ("monday", 0),
        ("dienstag", 1),
        ("tuesday", 1),
        ("mittwoch", 2),
        ("wednesday", 2),
        ("donnerstag", 3),
        ("thursday", 3),
        ("freitag", 4),
        ("friday", 4),
        ("samstag", 5),
        ("saturday", 5),
        ("sonntag", 6),
        ("sunday", 6),
    ];
    for (name, target) in WEEKDAYS {
        if lower.contains(name) {
            let current = today.weekday().num_days_from_monday();
            let mut ahead = (*target as i64 - current as i64).rem_euclid(7);
            if ahead == 0 {
                ahead = 7;
            }
            return Some(today + Duration::days(ahead));
        }
    }
    None
}

/// A "HH:MM" time anywhere in the text.
fn parse_time(text: &str) -> Option<(u32, u32)> {
    let caps = Regex::new(r"(\d{1,2}):(\d{2})").ok()?.captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

fn month_number(name: &str) -> Option<u32> {
    Some(match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mär" | "mar" => 3,
        "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "dez" | "dec" => 12,
        _ => return None,
    })
}

/// Expand two-digit years and pull implausibly-far futures back a century.
///
/// A scraped "86" means 1986, not 2086: anything more than 50 years ahead
/// of the current year is treated as a wrapped past date.
pub(crate) fn adjust_century(year: i32, current_year: i32) -> i32 {
    let mut year = year;
    if year < 100 {
        year += 2000;
    }
    if year > current_year + 50 {
        year -= 100;
    }
    year
}
