// src/extract/deadlines.rs

//! Deadline extraction from the Moodle dashboard timeline.
//!
//! Deadline candidates are links to assignment, quiz or forum activities.
//! Anchors whose text is a generic action verb ("Anzeigen", "Abgeben")
//! take their display name from the surrounding event container instead.
//! Duplicate links to the same activity are collapsed by their normalized
//! URL, first occurrence wins.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::extract::dates::parse_due_date;
use crate::extract::{element_text, selector};
use crate::models::DeadlineRecord;
use crate::utils::url::normalize_activity_url;

/// Anchor texts that point at an activity without naming it, lowercase.
const GENERIC_ACTIONS: &[&str] = &[
    "anzeigen",
    "abgeben",
    "details",
    "submission",
    "aufgabenlösung hinzufügen",
];

/// Pull deadline records out of a dashboard page.
///
/// `now` anchors relative phrases like "morgen" and the century heuristic,
/// and is injected for testability.
pub fn extract_deadlines(html: &str, now: NaiveDateTime) -> Vec<DeadlineRecord> {
    let (Ok(mod_re), Ok(container_re), Ok(name_re), Ok(course_re)) = (
        Regex::new(r"mod/(assign|quiz|forum)"),
        Regex::new(r"event|activity|list-group-item"),
        Regex::new(r"event-name|activityname"),
        Regex::new(r"course|text-muted|event-name"),
    ) else {
        return Vec::new();
    };
    let Some(anchor_sel) = selector("a") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or("");
        if href.is_empty() {
            continue;
        }
        if !mod_re.is_match(href) {
            // Generic verbs on calendar or course links are navigation
            // chrome, only activity paths carry deadlines.
            continue;
        }
        let anchor_text = element_text(anchor);
        let is_generic = GENERIC_ACTIONS.contains(&anchor_text.to_lowercase().as_str());

        let container = find_container(anchor, &container_re);

        let aria_label = anchor.value().attr("aria-label").unwrap_or("");
        let mut activity = anchor_text.clone();
        if is_generic {
            if let Some(better) = container.and_then(|c| better_name(c, &name_re)) {
                activity = better;
            }
        }
        if activity.is_empty() {
            activity = aria_label.trim().to_string();
        }
        if activity.is_empty() {
            continue;
        }

        if !seen.insert(normalize_activity_url(href)) {
            continue;
        }

        let course = container.and_then(|c| course_name(c, &course_re));
        let context = match container {
            Some(c) => element_text(c).replace(&activity, ""),
            None => anchor_text.clone(),
        };
        let search_text = format!("{aria_label} {context}");

        records.push(DeadlineRecord {
            activity,
            course,
            due: parse_due_date(&search_text, now),
            url: href.to_string(),
        });
    }

    log::debug!("Extracted {} deadline candidates", records.len());
    records
}

/// Nearest ancestor that looks like an event or activity container.
fn find_container<'a>(anchor: ElementRef<'a>, class_re: &Regex) -> Option<ElementRef<'a>> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            let name = el.value().name();
            (name == "div" || name == "li")
                && el.value().attr("class").is_some_and(|c| class_re.is_match(c))
        })
}

/// A display name better than a generic action text, if the container has
/// one.
fn better_name(container: ElementRef<'_>, name_re: &Regex) -> Option<String> {
    if let Some(sel) = selector("h6, span") {
        for el in container.select(&sel) {
            if el.value().attr("class").is_some_and(|c| name_re.is_match(c)) {
                let text = element_text(el);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    let sel = selector("strong")?;
    for el in container.select(&sel) {
        let text = element_text(el);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

fn course_name(container: ElementRef<'_>, course_re: &Regex) -> Option<String> {
    let sel = selector("small, span")?;
    for el in container.select(&sel) {
        if el.value().attr("class").is_some_and(|c| course_re.is_match(c)) {
            let text = element_text(el);
            let text = text.strip_prefix("Kurs: ").unwrap_or(&text).trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn activity_link_with_date_and_course() {
        let html = concat!(
            "<div class=\"list-group-item timeline-event\">",
            "<small class=\"text-muted\">Kurs: Mathematik II</small>",
            "<a href=\"https://m.example/mod/assign/view.php?id=42\">",
            "Übungsblatt 3</a>",
            "<span>Fällig am 20.02.2026, 12:00</span>",
            "</div>"
        );
        let records = extract_deadlines(html, now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activity, "Übungsblatt 3");
        assert_eq!(records[0].course.as_deref(), Some("Mathematik II"));
        assert_eq!(
            records[0].due,
            NaiveDate::from_ymd_opt(2026, 2, 20)
                .unwrap()
                .and_hms_opt(12, 0, 0)
        );
        assert_eq!(
            records[0].url,
            "https://m.example/mod/assign/view.php?id=42"
        );
    }

    #[test]
    fn duplicate_links_collapse_to_one_record() {
        let html = concat!(
            "<div class=\"event\">",
            "<a href=\"https://m.example/mod/quiz/view.php?id=7\">Quiz 1</a>",
            "<a href=\"https://m.example/mod/quiz/view.php?id=7&forceview=1\">Quiz 1</a>",
            "</div>"
        );
        let records = extract_deadlines(html, now());
        assert_eq!(records.len(), 1);
        // First occurrence wins, including its raw URL.
        assert_eq!(records[0].url, "https://m.example/mod/quiz/view.php?id=7");
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = concat!(
            "<div class=\"event\">",
            "<a href=\"https://m.example/mod/assign/view.php?id=9\">Blatt 1</a>",
            "</div>"
        );
        assert_eq!(extract_deadlines(html, now()), extract_deadlines(html, now()));
    }

    #[test]
    fn generic_action_takes_name_from_container() {
        let html = concat!(
            "<li class=\"list-group-item\">",
            "<h6 class=\"event-name\">Abgabe Projektbericht</h6>",
            "<span>morgen 10:00</span>",
            "<a href=\"https://m.example/mod/assign/view.php?id=11\">Abgeben</a>",
            "</li>"
        );
        let records = extract_deadlines(html, now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activity, "Abgabe Projektbericht");
        assert_eq!(
            records[0].due,
            NaiveDate::from_ymd_opt(2026, 1, 6)
                .unwrap()
                .and_hms_opt(10, 0, 0)
        );
    }

    #[test]
    fn generic_action_on_non_activity_path_is_ignored() {
        let html = "<p><a href=\"https://m.example/course/view.php?id=3\">Anzeigen</a></p>";
        assert!(extract_deadlines(html, now()).is_empty());
    }

    #[test]
    fn generic_action_in_event_container_still_needs_an_activity_path() {
        // The event container alone does not qualify a calendar link.
        let html = concat!(
            "<div class=\"list-group-item timeline-event\">",
            "<a href=\"https://m.example/calendar/view.php?id=99\">Anzeigen</a>",
            "</div>"
        );
        assert!(extract_deadlines(html, now()).is_empty());
    }

    #[test]
    fn generic_activity_link_without_container_keeps_its_text() {
        let html =
            "<p><a href=\"https://m.example/mod/assign/view.php?id=12\">Abgeben</a></p>";
        let records = extract_deadlines(html, now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activity, "Abgeben");
    }

    #[test]
    fn anchor_without_href_is_ignored() {
        let html = "<div class=\"event\"><a>Übungsblatt</a></div>";
        assert!(extract_deadlines(html, now()).is_empty());
    }

    #[test]
    fn missing_date_text_leaves_due_unset() {
        let html = concat!(
            "<div class=\"activity\">",
            "<a href=\"https://m.example/mod/forum/view.php?id=5\">Forum</a>",
            "</div>"
        );
        let records = extract_deadlines(html, now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].due, None);
    }

    #[test]
    fn empty_page_yields_no_records() {
        assert!(extract_deadlines("<html><body></body></html>", now()).is_empty());
    }
}
