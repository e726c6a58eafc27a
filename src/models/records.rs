// src/models/records.rs

//! Record types produced by the portal scrapers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// The three scraped portals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    /// BOSS exam administration
    ExamRecords,
    /// Moodle learning platform
    LearningManagement,
    /// LSF course registry
    CourseRegistry,
}

impl Site {
    /// Short tag used in log lines and diagnostic file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ExamRecords => "boss",
            Self::LearningManagement => "moodle",
            Self::CourseRegistry => "lsf",
        }
    }
}

/// Terminal state of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Landed back on the portal with a valid session
    Authenticated,
    /// The identity provider rejected the credentials
    InvalidCredentials,
    /// A second factor was demanded but no seed is available
    SecondFactorRequired,
    /// The portal is in a maintenance window
    Maintenance,
    /// No terminal state was reached before the deadline
    Timeout,
}

impl AuthOutcome {
    /// Convert into a `Result`, mapping every non-success state to its error.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Authenticated => Ok(()),
            Self::InvalidCredentials => Err(ScrapeError::InvalidCredentials),
            Self::SecondFactorRequired => Err(ScrapeError::SecondFactorRequired),
            Self::Maintenance => Err(ScrapeError::Maintenance),
            Self::Timeout => Err(ScrapeError::LoginTimeout),
        }
    }
}

/// One row of the exam records table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamRecord {
    /// Exam number as printed in the table
    #[serde(rename = "exam_id")]
    pub id: String,

    /// Exam title
    pub title: String,

    /// Semester the exam was taken in (e.g. "WiSe 2023/24")
    pub semester: String,

    /// Numeric grade, absent for ungraded or pass/fail entries
    pub grade: Option<f64>,

    /// Raw status text (e.g. "bestanden")
    pub status: String,

    /// ECTS credits awarded
    pub credits: f64,

    /// Whether this exam counts as passed
    pub passed: bool,
}

/// Degree program identification scraped from the exam portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DegreeIdentity {
    /// Degree type, normalized to "Bachelor" or "Master" where recognized
    pub degree_type: Option<String>,

    /// Numeric degree code (e.g. "82")
    pub degree_number: Option<String>,

    /// Program code (e.g. "B105")
    pub program_id: Option<String>,

    /// Program display name
    pub program_name: Option<String>,

    /// Examination regulations version
    pub po_version: Option<String>,
}

impl DegreeIdentity {
    /// True when no strategy managed to fill a single field.
    pub fn is_empty(&self) -> bool {
        self.degree_type.is_none()
            && self.degree_number.is_none()
            && self.program_id.is_none()
            && self.program_name.is_none()
            && self.po_version.is_none()
    }
}

/// Aggregate figures over all exam records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GradeSummary {
    /// Sum of credits over passing exams
    pub total_credits: f64,

    /// Grade average, official if the portal printed one
    pub average_grade: Option<f64>,

    /// Best numeric grade among passing exams
    pub best_grade: Option<f64>,
}

/// Complete result of one exam portal scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeReport {
    /// Degree program the records belong to
    pub degree_identity: DegreeIdentity,

    /// Exam rows in table order, summary row excluded
    pub exams: Vec<ExamRecord>,

    /// Aggregates over the exam rows
    pub summary: GradeSummary,

    /// When this report was scraped
    pub fetched_at: DateTime<Utc>,
}

/// A due activity from the Moodle timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeadlineRecord {
    /// Activity name (e.g. an assignment title)
    #[serde(rename = "activity_name")]
    pub activity: String,

    /// Course the activity belongs to, when identifiable
    #[serde(rename = "course_name")]
    pub course: Option<String>,

    /// Parsed due date, absent when no date text was found
    #[serde(rename = "due_date")]
    pub due: Option<NaiveDateTime>,

    /// Link to the activity as found on the page
    #[serde(rename = "source_url")]
    pub url: String,
}

/// An enrolled course from the LSF lecture overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRecord {
    /// Course title as listed, usually prefixed with its number
    pub name: String,
}

/// Deadlines and enrolled courses from one combined scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    /// Due activities from the learning platform
    pub deadlines: Vec<DeadlineRecord>,

    /// Enrolled courses from the course registry
    pub classes: Vec<ClassRecord>,

    /// When this overview was scraped
    pub fetched_at: DateTime<Utc>,
}

/// Uniform envelope returned to callers.
///
/// Scrape failures are reported as data, not panics: `success` is false and
/// `error` carries a stable failure category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResult<T> {
    /// Whether the scrape produced usable data
    pub success: bool,

    /// The scraped payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Stable failure category on failure (e.g. "invalid_credentials")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ScrapeResult<T> {
    /// Wrap a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wrap a failure under its stable category.
    pub fn fail(error: &ScrapeError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.category().to_string()),
        }
    }
}

impl<T> From<Result<T>> for ScrapeResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_outcome_maps_to_errors() {
        assert!(AuthOutcome::Authenticated.into_result().is_ok());
        assert!(matches!(
            AuthOutcome::InvalidCredentials.into_result(),
            Err(ScrapeError::InvalidCredentials)
        ));
        assert!(matches!(
            AuthOutcome::SecondFactorRequired.into_result(),
            Err(ScrapeError::SecondFactorRequired)
        ));
        assert!(matches!(
            AuthOutcome::Maintenance.into_result(),
            Err(ScrapeError::Maintenance)
        ));
        assert!(matches!(
            AuthOutcome::Timeout.into_result(),
            Err(ScrapeError::LoginTimeout)
        ));
    }

    #[test]
    fn scrape_result_wraps_errors_as_categories() {
        let result: ScrapeResult<Vec<ClassRecord>> =
            Err(ScrapeError::InvalidCredentials).into();
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error.as_deref(), Some("invalid_credentials"));
    }

    #[test]
    fn scrape_result_wraps_payloads() {
        let result: ScrapeResult<Vec<ClassRecord>> = Ok(vec![ClassRecord {
            name: "030123 Analysis I".to_string(),
        }])
        .into();
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.data.map(|d| d.len()), Some(1));
    }

    #[test]
    fn scrape_result_json_omits_absent_fields() {
        let ok: ScrapeResult<Vec<ClassRecord>> = ScrapeResult::ok(Vec::new());
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"success":true,"data":[]}"#
        );
        let fail: ScrapeResult<Vec<ClassRecord>> = ScrapeResult::fail(&ScrapeError::Maintenance);
        assert_eq!(
            serde_json::to_string(&fail).unwrap(),
            r#"{"success":false,"error":"maintenance"}"#
        );
    }

    #[test]
    fn record_json_uses_the_published_field_names() {
        let exam = ExamRecord {
            id: "1".to_string(),
            title: "Analysis I".to_string(),
            semester: "WS23".to_string(),
            grade: Some(2.0),
            status: "bestanden".to_string(),
            credits: 9.0,
            passed: true,
        };
        let json = serde_json::to_value(&exam).unwrap();
        assert_eq!(json["exam_id"], "1");
        assert!(json.get("id").is_none());

        let deadline = DeadlineRecord {
            activity: "Übungsblatt 3".to_string(),
            course: Some("Mathematik II".to_string()),
            due: None,
            url: "https://m.example/mod/assign/view.php?id=42".to_string(),
        };
        let json = serde_json::to_value(&deadline).unwrap();
        assert_eq!(json["activity_name"], "Übungsblatt 3");
        assert_eq!(json["course_name"], "Mathematik II");
        assert!(json["due_date"].is_null());
        assert_eq!(
            json["source_url"],
            "https://m.example/mod/assign/view.php?id=42"
        );
        assert!(json.get("url").is_none());
    }

    #[test]
    fn empty_degree_identity_reports_empty() {
        assert!(DegreeIdentity::default().is_empty());
        let partial = DegreeIdentity {
            program_id: Some("B105".to_string()),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn site_tags_are_distinct() {
        assert_eq!(Site::ExamRecords.tag(), "boss");
        assert_eq!(Site::LearningManagement.tag(), "moodle");
        assert_eq!(Site::CourseRegistry.tag(), "lsf");
    }
}
