// src/extract/grades.rs

//! Exam record extraction from the BOSS achievement page.
//!
//! The page layout differs between degree programs and portal releases, so
//! nothing here assumes fixed columns. The grades table is recognized by
//! its vocabulary, columns are mapped by header text, and the degree
//! program is pieced together from four independent fallback strategies.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::extract::{element_text, selector};
use crate::models::{DegreeIdentity, ExamRecord, GradeReport, GradeSummary};
use crate::utils::text::{parse_decimal, round2};

/// Vocabulary identifying the grades table (case sensitive).
const TABLE_MARKERS: &[&str] = &["Prüfung", "Exam", "ECTS"];

/// Lowercase markers identifying a trailing official summary row.
const SUMMARY_MARKERS: &[&str] = &["durchschnitt", "gesamt", "alle module", "average", "total"];

/// Parse the full achievement page into a report.
pub fn parse_grade_report(html: &str, fetched_at: DateTime<Utc>) -> GradeReport {
    let (exams, summary) = extract_exam_records(html);
    let degree_identity = extract_degree_identity(html);
    log::info!(
        "Extracted {} exam records ({} passed)",
        exams.len(),
        exams.iter().filter(|e| e.passed).count()
    );
    GradeReport {
        degree_identity,
        exams,
        summary,
        fetched_at,
    }
}

/// Column positions resolved from header text.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnMap {
    id: Option<usize>,
    title: Option<usize>,
    semester: Option<usize>,
    grade: Option<usize>,
    status: Option<usize>,
    credits: Option<usize>,
}

impl ColumnMap {
    /// Map columns by recognizable header fragments, German or English.
    ///
    /// Indices count within one header row. The table carries other `<th>`
    /// rows too (degree identity above the column headers), so each row
    /// starts at zero and later rows override earlier ones.
    fn from_header_rows(rows: &[Vec<String>]) -> Self {
        let mut map = Self::default();
        for headers in rows {
            for (idx, header) in headers.iter().enumerate() {
                let h = header.to_lowercase();
                if h.contains("nr") || (h.contains("id") && !h.contains("ver")) {
                    map.id = Some(idx);
                } else if h.contains("text") || h.contains("bezeichnung") {
                    map.title = Some(idx);
                } else if h.contains("sem") {
                    map.semester = Some(idx);
                } else if h.contains("note") || h.contains("grade") {
                    map.grade = Some(idx);
                } else if h.contains("status") || h.contains("vermerk") {
                    map.status = Some(idx);
                } else if h.contains("ects") || h.contains("credit") || h.contains("bonus") {
                    map.credits = Some(idx);
                }
            }
        }
        map
    }

    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.semester.is_none()
            && self.grade.is_none()
            && self.status.is_none()
            && self.credits.is_none()
    }

    /// Conventional BOSS column order, used when no header is recognized.
    fn positional() -> Self {
        Self {
            id: Some(0),
            title: Some(1),
            semester: Some(2),
            grade: Some(3),
            status: Some(4),
            credits: Some(5),
        }
    }
}

/// Extract exam rows and aggregate figures from the page.
///
/// A page without a recognizable grade table yields an empty result,
/// not an error.
pub fn extract_exam_records(html: &str) -> (Vec<ExamRecord>, GradeSummary) {
    let document = Html::parse_document(html);
    let Some(table) = find_grades_table(&document) else {
        log::warn!("No grade table found on achievement page");
        return (Vec::new(), GradeSummary::default());
    };

    let mut map = ColumnMap::from_header_rows(&header_rows(table));
    if map.is_empty() {
        map = ColumnMap::positional();
    }

    let rows = data_rows(table);
    let mut records = Vec::new();
    let mut official_average = None;
    let mut official_credits = None;

    for (i, cells) in rows.iter().enumerate() {
        let row_text = cells.join(" ").to_lowercase();
        if i == rows.len() - 1 && SUMMARY_MARKERS.iter().any(|m| row_text.contains(m)) {
            // Official aggregate row printed by the portal. Consume it
            // instead of emitting a fake exam record.
            official_average = parse_decimal(&cell(cells, map.grade)).filter(|v| *v > 0.0);
            official_credits = parse_decimal(&cell(cells, map.credits)).filter(|v| *v > 0.0);
            continue;
        }

        let title = cell(cells, map.title);
        if title.is_empty() {
            log::debug!("Skipping row {i} without a title: {row_text:?}");
            continue;
        }
        let grade = parse_decimal(&cell(cells, map.grade));
        let status = cell(cells, map.status);
        let credits = parse_decimal(&cell(cells, map.credits)).unwrap_or(0.0);
        let passed = is_passed(&status, grade);
        records.push(ExamRecord {
            id: cell(cells, map.id),
            title,
            semester: cell(cells, map.semester),
            grade,
            status,
            credits,
            passed,
        });
    }

    let summary = summarize(&records, official_average, official_credits);
    (records, summary)
}

/// Whether an exam row counts as passed.
///
/// An explicit "nicht bestanden" always loses, an explicit "bestanden" (or
/// the "be" shorthand) always wins, and only then does a numeric grade in
/// the passing band decide.
pub fn is_passed(status: &str, grade: Option<f64>) -> bool {
    let status = status.to_lowercase();
    if status.contains("nicht bestanden") {
        return false;
    }
    if status.contains("bestanden") || status.trim() == "be" {
        return true;
    }
    matches!(grade, Some(g) if (1.0..=4.0).contains(&g))
}

fn summarize(
    records: &[ExamRecord],
    official_average: Option<f64>,
    official_credits: Option<f64>,
) -> GradeSummary {
    let computed_credits: f64 = records.iter().filter(|r| r.passed).map(|r| r.credits).sum();
    let graded: Vec<f64> = records
        .iter()
        .filter(|r| r.passed)
        .filter_map(|r| r.grade)
        .filter(|g| *g > 0.0)
        .collect();
    let computed_average = if graded.is_empty() {
        None
    } else {
        Some(round2(graded.iter().sum::<f64>() / graded.len() as f64))
    };
    GradeSummary {
        total_credits: official_credits.unwrap_or(computed_credits),
        average_grade: official_average.or(computed_average),
        best_grade: graded.iter().copied().reduce(f64::min),
    }
}

fn find_grades_table(document: &Html) -> Option<ElementRef<'_>> {
    let table_sel = selector("table")?;
    document.select(&table_sel).find(|table| {
        let text = element_text(*table);
        TABLE_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

/// The `<th>` cells of every header row, grouped by row.
fn header_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let (Some(tr_sel), Some(th_sel)) = (selector("tr"), selector("th")) else {
        return Vec::new();
    };
    table
        .select(&tr_sel)
        .map(|tr| tr.select(&th_sel).map(element_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// All rows of the table with at least three cells, as normalized cell
/// texts. Header-only and layout rows fall out here.
fn data_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let (Some(tr_sel), Some(td_sel)) = (selector("tr"), selector("td")) else {
        return Vec::new();
    };
    table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(element_text).collect::<Vec<_>>())
        .filter(|cells| cells.len() >= 3)
        .collect()
}

fn cell(cells: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| cells.get(i)).cloned().unwrap_or_default()
}

/// Identify the degree program from whatever the page offers.
///
/// Four strategies run in order and each identity field keeps the first
/// value any strategy produced.
pub fn extract_degree_identity(html: &str) -> DegreeIdentity {
    let document = Html::parse_document(html);
    let mut identity = DegreeIdentity::default();

    // Bracketed codes in header cells, e.g. "Abschluss:[82] Bachelor".
    if let Some(th_sel) = selector("th") {
        let degree = Regex::new(r"Abschluss:\[(\d+)\]\s*([^S]+)").ok();
        let program = Regex::new(r"(?i)Studiengang:\[([A-Z]\d+)\]\s*(.+?)(?:\(|$)").ok();
        for th in document.select(&th_sel) {
            let text = element_text(th);
            if identity.degree_number.is_none() {
                if let Some(caps) = degree.as_ref().and_then(|re| re.captures(&text)) {
                    identity.degree_number = Some(caps[1].to_string());
                    identity.degree_type = Some(classify_degree(&caps[2]));
                }
            }
            if identity.program_id.is_none() {
                if let Some(caps) = program.as_ref().and_then(|re| re.captures(&text)) {
                    identity.program_id = Some(caps[1].to_uppercase());
                    identity.program_name = Some(caps[2].trim().to_string());
                }
            }
        }
    }

    // Flowing text, e.g. "Abschluss 82 Bachelor".
    if identity.degree_number.is_none() {
        let page_text = element_text(document.root_element());
        if let Some(caps) = Regex::new(r"Abschluss\s+(\d+)\s+(Bachelor|Master)")
            .ok()
            .and_then(|re| re.captures(&page_text))
        {
            identity.degree_number = Some(caps[1].to_string());
            identity.degree_type = Some(caps[2].to_string());
        }
    }

    // Program name with PO version in the list styling.
    if identity.po_version.is_none() {
        if let (Some(font_sel), Ok(re)) = (
            selector("font.liste1"),
            Regex::new(r"(.+?)\s*\(PO-Version\s+(\d+)\)"),
        ) {
            for font in document.select(&font_sel) {
                let text = element_text(font);
                if let Some(caps) = re.captures(&text) {
                    if identity.program_name.is_none() {
                        identity.program_name = Some(caps[1].trim().to_string());
                    }
                    identity.po_version = Some(caps[2].to_string());
                    break;
                }
            }
        }
    }

    // Raw link parameters as the last resort.
    if identity.program_id.is_none() {
        if let Some(caps) = Regex::new(r"stg=([A-Za-z]\d+)")
            .ok()
            .and_then(|re| re.captures(html))
        {
            identity.program_id = Some(caps[1].to_uppercase());
        }
    }
    if identity.degree_number.is_none() {
        if let Some(caps) = Regex::new(r"(?i)abschl(?:uss)?[:=](\d+)")
            .ok()
            .and_then(|re| re.captures(html))
        {
            identity.degree_number = Some(caps[1].to_string());
        }
    }
    if identity.degree_type.is_none() {
        identity.degree_type = match identity.degree_number.as_deref() {
            Some("82") => Some("Bachelor".to_string()),
            Some("88") => Some("Master".to_string()),
            _ => None,
        };
    }

    identity
}

fn classify_degree(text: &str) -> String {
    if text.contains("Bachelor") {
        "Bachelor".to_string()
    } else if text.contains("Master") {
        "Master".to_string()
    } else {
        text.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}
