// src/portals/deadlines.rs

//! Navigator for the Moodle dashboard timeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use thirtyfour::By;

use crate::auth::CredentialInjector;
use crate::error::Result;
use crate::extract::deadlines;
use crate::models::{Config, Credential, DeadlineRecord, Site};
use crate::portals::{origin_marker, Portal};
use crate::session::SessionDriver;

/// The dashboard path, also Moodle's own logged-in redirect target.
const DASHBOARD_PATH: &str = "/my";

fn uniaccount_links() -> Vec<By> {
    vec![By::XPath(
        "//a[contains(text(), 'UniAccount') or contains(@href, 'itmc')]",
    )]
}

/// Scrapes due activities from the dashboard timeline.
pub struct DeadlineNavigator {
    config: Arc<Config>,
}

impl DeadlineNavigator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Portal for DeadlineNavigator {
    type Output = Vec<DeadlineRecord>;

    fn site(&self) -> Site {
        Site::LearningManagement
    }

    async fn run(
        &self,
        session: &SessionDriver,
        credential: &Credential,
    ) -> Result<Vec<DeadlineRecord>> {
        let portals = &self.config.portals;
        session.navigate(&portals.moodle_login_url).await?;

        if !session.current_url().await?.contains(DASHBOARD_PATH) {
            // The login page sometimes needs the UniAccount hop before it
            // redirects to SSO. Best effort, the page may also redirect on
            // its own.
            if let Ok(link) = session.find_first(&uniaccount_links()).await {
                let _ = link.click().await;
            }
            CredentialInjector::new(session)
                .login(credential, &origin_marker(&portals.moodle_login_url))
                .await?
                .into_result()?;
        }

        if !session.current_url().await?.contains(DASHBOARD_PATH) {
            session.navigate(&portals.moodle_dashboard_url).await?;
        }

        let timeline = session
            .wait_for_first(&[By::Css("[data-region='timeline'], .block_timeline")])
            .await;
        if timeline.is_err() {
            // A dashboard without a timeline block has nothing due.
            session.dump_diagnostics("moodle_timeline_missing").await;
            return Ok(Vec::new());
        }

        expand_timeline_filter(session).await;

        let html = session.source().await?;
        Ok(deadlines::extract_deadlines(
            &html,
            Local::now().naive_local(),
        ))
    }
}

/// Switch the timeline filter to "all" so deadlines beyond the default
/// window render too. The filter markup changes often, failures are fine.
async fn expand_timeline_filter(session: &SessionDriver) {
    let Ok(dropdown) = session
        .find_first(&[By::Css("[id^='timeline-day-filter']")])
        .await
    else {
        return;
    };
    if dropdown.click().await.is_err() {
        return;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    let Ok(option) = session.find_first(&[By::Css("[data-filtername='all']")]).await else {
        return;
    };
    if option.click().await.is_err() {
        return;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;
}
