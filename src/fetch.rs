// src/fetch.rs

//! Caching facade over the portal navigators.

use std::sync::Arc;

use chrono::Utc;

use crate::cache::ResultCache;
use crate::error::ScrapeError;
use crate::models::{
    derive_cache_key, ClassRecord, Config, Credential, DeadlineRecord, GradeReport, Overview,
    ScrapeResult,
};
use crate::portals::{run_portal, CourseNavigator, DeadlineNavigator, ExamNavigator};

/// Entry point for callers: runs scrapes and keeps successful results warm.
///
/// Credentials pass through per call and are never stored, only their
/// digests survive as cache keys.
pub struct Fetcher {
    config: Arc<Config>,
    grades: ResultCache<GradeReport>,
    overview: ResultCache<Overview>,
}

impl Fetcher {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            grades: ResultCache::from_config(&config.cache),
            overview: ResultCache::from_config(&config.cache),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the grade report, served from cache when fresh.
    pub async fn fetch_grades(
        &self,
        credential: &Credential,
        force_refresh: bool,
    ) -> ScrapeResult<GradeReport> {
        let key = credential.cache_key();
        if force_refresh {
            self.grades.remove(&key);
        } else if let Some(report) = self.grades.get(&key) {
            log::info!("Grade report served from cache");
            return ScrapeResult::ok(report);
        }
        let navigator = ExamNavigator::new(self.config.clone());
        let outcome = run_portal(self.config.clone(), &navigator, credential).await;
        if let Ok(report) = &outcome {
            self.grades.put(key, report.clone());
        }
        outcome.into()
    }

    /// Fetch deadlines and enrolled courses in one pass, cache-backed.
    ///
    /// Failures are asymmetric: an authentication failure on the first
    /// portal is terminal since the same credentials would fail everywhere,
    /// while any other per-site failure degrades to an empty section so one
    /// flaky portal cannot take down the whole overview.
    pub async fn fetch_overview(
        &self,
        credential: &Credential,
        force_refresh: bool,
    ) -> ScrapeResult<Overview> {
        let key = credential.cache_key();
        if force_refresh {
            self.overview.remove(&key);
        } else if let Some(overview) = self.overview.get(&key) {
            log::info!("Overview served from cache");
            return ScrapeResult::ok(overview);
        }

        let deadline_nav = DeadlineNavigator::new(self.config.clone());
        let deadlines = match run_portal(self.config.clone(), &deadline_nav, credential).await {
            Ok(deadlines) => deadlines,
            Err(e) if is_auth_failure(&e) => return ScrapeResult::fail(&e),
            Err(e) => {
                log::warn!("Continuing without deadlines: {e}");
                Vec::new()
            }
        };

        let course_nav = CourseNavigator::new(self.config.clone());
        let classes = match run_portal(self.config.clone(), &course_nav, credential).await {
            Ok(classes) => classes,
            Err(e) => {
                log::warn!("Continuing without course list: {e}");
                Vec::new()
            }
        };

        let overview = Overview {
            deadlines,
            classes,
            fetched_at: Utc::now(),
        };
        self.overview.put(key, overview.clone());
        ScrapeResult::ok(overview)
    }

    /// Fetch deadlines only. Uncached, single-site calls are cheap enough.
    pub async fn fetch_deadlines(
        &self,
        credential: &Credential,
    ) -> ScrapeResult<Vec<DeadlineRecord>> {
        let navigator = DeadlineNavigator::new(self.config.clone());
        run_portal(self.config.clone(), &navigator, credential)
            .await
            .into()
    }

    /// Fetch enrolled courses only, uncached.
    pub async fn fetch_classes(&self, credential: &Credential) -> ScrapeResult<Vec<ClassRecord>> {
        let navigator = CourseNavigator::new(self.config.clone());
        run_portal(self.config.clone(), &navigator, credential)
            .await
            .into()
    }

    /// Drop cached results for one account, or everything.
    ///
    /// With the secret the exact entry is dropped. Without it the key
    /// cannot be derived, so all entries go rather than leaving stale data
    /// behind.
    pub fn invalidate(&self, identity: &str, secret: Option<&str>) {
        match secret {
            Some(secret) => {
                let key = derive_cache_key(identity, secret);
                self.grades.remove(&key);
                self.overview.remove(&key);
            }
            None => {
                log::info!("Clearing all cached results");
                self.grades.clear();
                self.overview.clear();
            }
        }
    }
}

/// Whether an error proves the credentials themselves cannot succeed.
fn is_auth_failure(error: &ScrapeError) -> bool {
    matches!(
        error,
        ScrapeError::InvalidCredentials
            | ScrapeError::SecondFactorRequired
            | ScrapeError::Maintenance
    )
}
