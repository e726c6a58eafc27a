// src/portals/exams.rs

//! Navigator for the BOSS exam records portal.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thirtyfour::By;

use crate::auth::CredentialInjector;
use crate::error::Result;
use crate::extract::grades;
use crate::models::{Config, Credential, GradeReport, Site};
use crate::portals::{origin_marker, Portal};
use crate::session::SessionDriver;

/// Markers proving the achievement table has rendered (case sensitive).
const GRADES_PAGE_MARKERS: &[&str] = &["Prüfung", "Exam", "ECTS"];

// Anchor texts match by substring: the portal pads link texts with
// whitespace and icons, exact matches would miss them.
fn login_links() -> Vec<By> {
    vec![
        By::XPath("//a[contains(text(), 'Anmelden')]"),
        By::XPath("//a[contains(text(), 'Login')]"),
    ]
}

fn exam_menu_links() -> Vec<By> {
    vec![
        By::XPath("//a[contains(text(), 'Prüfungsverwaltung')]"),
        By::XPath("//a[contains(text(), 'Exam Administration')]"),
        By::Css("a[href*='menue=n']"),
    ]
}

fn grade_overview_links() -> Vec<By> {
    vec![
        By::XPath("//a[contains(text(), 'Notenspiegel')]"),
        By::XPath("//a[contains(text(), 'Notenübersicht')]"),
        By::XPath("//a[contains(text(), 'Grades')]"),
    ]
}

fn achievement_links() -> Vec<By> {
    vec![
        By::Css("a[title='Leistungen anzeigen']"),
        By::Css("a[title='Show achievements']"),
        By::Css("a[title*='Notenspiegel']"),
        By::Css("a[href*='notenspiegelStudent'] img[title='Leistungen anzeigen']"),
    ]
}

/// Scrapes the exam records table into a grade report.
pub struct ExamNavigator {
    config: Arc<Config>,
}

impl ExamNavigator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Click through the menu chain to the achievement table.
    async fn navigate_to_grades(&self, session: &SessionDriver) -> Result<()> {
        let menu = session.wait_for_first(&exam_menu_links()).await?;
        menu.click().await?;
        session.settle().await;

        let overview = session.wait_for_first(&grade_overview_links()).await?;
        overview.click().await?;
        session.settle().await;

        // One achievement link per degree program, collected across all
        // selector variants. The last one is usually the most specific in
        // the tree and belongs to the program currently studied.
        let links = session.collect_all(&achievement_links()).await;
        if let Some(last) = links.last() {
            log::debug!("Found {} achievement links", links.len());
            let target = if last.tag_name().await?.eq_ignore_ascii_case("img") {
                last.find(By::XPath("..")).await?
            } else {
                last.clone()
            };
            target.click().await?;

            let rendered = session
                .wait_for_source_any(GRADES_PAGE_MARKERS, session.wait_timeout())
                .await?;
            if !rendered {
                session.dump_diagnostics("boss_navigation_timeout").await;
            }
        } else if let Ok(link) = session.find_first(&[By::Css("a[href*='asi']")]).await {
            // No achievement icon anywhere; the session scoped link is the
            // legacy route to the same table.
            if link.click().await.is_ok() {
                session.settle().await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Portal for ExamNavigator {
    type Output = GradeReport;

    fn site(&self) -> Site {
        Site::ExamRecords
    }

    async fn run(
        &self,
        session: &SessionDriver,
        credential: &Credential,
    ) -> Result<GradeReport> {
        let portals = &self.config.portals;
        session.navigate(&portals.exam_url).await?;

        // BOSS usually hands over to SSO on its own. If it stays on its
        // start page, a login link does the handover.
        let at_sso = session
            .wait_for_url_contains(&portals.sso_marker, session.wait_timeout())
            .await?;
        if !at_sso {
            if let Ok(link) = session.find_first(&login_links()).await {
                if link.click().await.is_ok() {
                    session.settle().await;
                }
            }
        }

        CredentialInjector::new(session)
            .login(credential, &origin_marker(&portals.exam_url))
            .await?
            .into_result()?;

        self.navigate_to_grades(session).await?;
        let html = session.source().await?;
        Ok(grades::parse_grade_report(&html, Utc::now()))
    }
}
