// src/portals/courses.rs

//! Navigator for the LSF course registry.

use std::sync::Arc;

use async_trait::async_trait;
use thirtyfour::By;

use crate::auth::CredentialInjector;
use crate::error::Result;
use crate::extract::courses;
use crate::models::{ClassRecord, Config, Credential, Site};
use crate::portals::{origin_marker, Portal};
use crate::session::SessionDriver;

/// Marker for an active LSF session (the logout link).
const LOGGED_IN_MARKER: &str = "Abmelden";

/// Query fragment of the lecture overview deep link.
const LECTURES_CONTEXT: &str = "state=wscheck";

// Substring matches, the portal decorates its link texts.
fn login_links() -> Vec<By> {
    vec![
        By::XPath("//a[contains(text(), 'Anmelden')]"),
        By::XPath("//a[contains(text(), 'Login')]"),
        By::XPath("//a[contains(text(), 'Einloggen')]"),
    ]
}

/// Scrapes enrolled courses from the lecture overview.
pub struct CourseNavigator {
    config: Arc<Config>,
}

impl CourseNavigator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Portal for CourseNavigator {
    type Output = Vec<ClassRecord>;

    fn site(&self) -> Site {
        Site::CourseRegistry
    }

    async fn run(
        &self,
        session: &SessionDriver,
        credential: &Credential,
    ) -> Result<Vec<ClassRecord>> {
        let portals = &self.config.portals;
        let marker = origin_marker(&portals.lsf_lectures_url);
        session.navigate(&portals.lsf_lectures_url).await?;

        let logged_in = session.current_url().await?.contains(&marker)
            && session.source().await?.contains(LOGGED_IN_MARKER);
        if !logged_in {
            // LSF does not redirect to SSO by itself, the login link does.
            if let Ok(link) = session.find_first(&login_links()).await {
                if link.click().await.is_ok() {
                    session.settle().await;
                }
            }
            CredentialInjector::new(session)
                .login(credential, &marker)
                .await?
                .into_result()?;

            // The deep link context gets lost during the SSO round trip.
            if !session.current_url().await?.contains(LECTURES_CONTEXT) {
                session.navigate(&portals.lsf_lectures_url).await?;
            }
        }

        let html = session.source().await?;
        Ok(courses::extract_classes(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_catalogue_matches_anchor_text_by_substring() {
        for by in login_links() {
            let rendered = format!("{by:?}");
            assert!(!rendered.contains("LinkText"), "exact-match locator: {rendered}");
            assert!(rendered.contains("contains(text()"));
        }
    }
}
