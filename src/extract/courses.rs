// src/extract/courses.rs

//! Enrolled-course extraction from the LSF lecture overview.
//!
//! The overview page is table soup without usable classes or ids. The one
//! stable property is document order: course links appear between the
//! "Aktuelle Veranstaltungen" heading and the "Absolvierte Veranstaltungen"
//! heading. The page is flattened into that order and links are qualified
//! by a course-number pattern or a nearby "Veranstaltung:" label.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::extract::element_text;
use crate::models::ClassRecord;
use crate::utils::text::normalize_whitespace;

const START_MARKER: &str = "Aktuelle Veranstaltungen";
const END_MARKER: &str = "Absolvierte Veranstaltungen";

/// Label preceding course links in some layouts.
const COURSE_LABEL: &str = "Veranstaltung:";

/// How many flat nodes back the course label may sit.
const LABEL_LOOKBACK: usize = 20;

/// Link texts that are schedule chrome rather than course names, lowercase.
const JUNK_MARKERS: &[&str] = &[
    "tag",
    "zeit",
    "rhythmus",
    "dauer",
    "raum",
    "lehrperson",
    "hinweis",
    "belegungsinformation",
    "findet statt",
    "belegungs-",
    "pdf",
    "stundenplan",
    "anmelden",
    "login",
];

const MIN_NAME_LENGTH: usize = 5;

enum FlatNode {
    Text(String),
    Anchor(String),
}

/// Extract current course names in page order.
///
/// Without the start heading the section boundaries are unknown and the
/// result is empty rather than guessed.
pub fn extract_classes(html: &str) -> Vec<ClassRecord> {
    let Ok(number_re) = Regex::new(r"\d{4,6}") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let nodes = flatten(&document);

    let Some(start) = nodes.iter().position(|n| node_text(n).contains(START_MARKER)) else {
        log::debug!("Course section heading not found, treating page as empty");
        return Vec::new();
    };
    let end = nodes
        .iter()
        .skip(start + 1)
        .position(|n| node_text(n).contains(END_MARKER))
        .map(|offset| start + 1 + offset)
        .unwrap_or(nodes.len());

    let mut seen = HashSet::new();
    let mut classes = Vec::new();
    for idx in (start + 1)..end {
        let FlatNode::Anchor(text) = &nodes[idx] else {
            continue;
        };
        let qualified = number_re.is_match(text) || has_course_label(&nodes, idx, start + 1);
        if !qualified {
            continue;
        }
        let lower = text.to_lowercase();
        if JUNK_MARKERS.iter().any(|junk| lower.contains(junk)) {
            continue;
        }
        if text.chars().count() < MIN_NAME_LENGTH {
            continue;
        }
        if seen.insert(text.clone()) {
            classes.push(ClassRecord { name: text.clone() });
        }
    }

    log::debug!("Extracted {} current courses", classes.len());
    classes
}

/// Flatten text nodes and anchors into document order.
fn flatten(document: &Html) -> Vec<FlatNode> {
    let mut nodes = Vec::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let normalized = normalize_whitespace(text);
            if !normalized.is_empty() {
                nodes.push(FlatNode::Text(normalized));
            }
        } else if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == "a" {
                nodes.push(FlatNode::Anchor(element_text(element)));
            }
        }
    }
    nodes
}

fn node_text(node: &FlatNode) -> &str {
    match node {
        FlatNode::Text(t) | FlatNode::Anchor(t) => t,
    }
}

/// Whether a "Veranstaltung:" label appears shortly before this node.
///
/// The window never reaches back past `floor`, labels outside the current
/// section must not qualify links inside it.
fn has_course_label(nodes: &[FlatNode], idx: usize, floor: usize) -> bool {
    nodes[idx.saturating_sub(LABEL_LOOKBACK).max(floor)..idx]
        .iter()
        .any(|n| matches!(n, FlatNode::Text(t) if t.contains(COURSE_LABEL)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(classes: &[ClassRecord]) -> Vec<&str> {
        classes.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn extracts_numbered_courses_between_markers() {
        let html = concat!(
            "<html><body>",
            "<h2>Aktuelle Veranstaltungen:</h2>",
            "<table><tr><td><a href=\"x\">030123 Analysis II</a></td></tr>",
            "<tr><td><a href=\"x\">042567 Rechnernetze</a></td></tr></table>",
            "<h2>Absolvierte Veranstaltungen:</h2>",
            "<a href=\"x\">010001 Altes Seminar</a>",
            "</body></html>"
        );
        let classes = extract_classes(html);
        assert_eq!(
            names(&classes),
            vec!["030123 Analysis II", "042567 Rechnernetze"]
        );
    }

    #[test]
    fn missing_start_marker_yields_empty() {
        let html = concat!(
            "<html><body>",
            "<a href=\"x\">030123 Analysis II</a>",
            "</body></html>"
        );
        assert!(extract_classes(html).is_empty());
    }

    #[test]
    fn course_label_qualifies_links_without_numbers() {
        let html = concat!(
            "<html><body>",
            "<p>Aktuelle Veranstaltungen:</p>",
            "<span>Veranstaltung:</span>",
            "<a href=\"x\">Seminar Maschinelles Lernen</a>",
            "</body></html>"
        );
        let classes = extract_classes(html);
        assert_eq!(names(&classes), vec!["Seminar Maschinelles Lernen"]);
    }

    #[test]
    fn course_label_before_the_section_does_not_qualify() {
        let html = concat!(
            "<html><body>",
            "<span>Veranstaltung:</span>",
            "<p>Aktuelle Veranstaltungen:</p>",
            "<a href=\"x\">Seminar Maschinelles Lernen</a>",
            "</body></html>"
        );
        assert!(extract_classes(html).is_empty());
    }

    #[test]
    fn unlabeled_links_without_numbers_are_ignored() {
        let html = concat!(
            "<html><body>",
            "<p>Aktuelle Veranstaltungen:</p>",
            "<a href=\"x\">Irgendein Querverweis</a>",
            "</body></html>"
        );
        assert!(extract_classes(html).is_empty());
    }

    #[test]
    fn schedule_chrome_is_filtered() {
        let html = concat!(
            "<html><body>",
            "<p>Aktuelle Veranstaltungen:</p>",
            "<a href=\"x\">030123 Analysis II</a>",
            "<a href=\"x\">Stundenplan 2026</a>",
            "<a href=\"x\">12345 PDF Export</a>",
            "</body></html>"
        );
        assert_eq!(names(&extract_classes(html)), vec!["030123 Analysis II"]);
    }

    #[test]
    fn short_and_duplicate_names_are_dropped() {
        let html = concat!(
            "<html><body>",
            "<p>Aktuelle Veranstaltungen:</p>",
            "<a href=\"x\">1234</a>",
            "<a href=\"x\">030123 Analysis II</a>",
            "<a href=\"x\">030123 Analysis II</a>",
            "</body></html>"
        );
        assert_eq!(names(&extract_classes(html)), vec!["030123 Analysis II"]);
    }
}
