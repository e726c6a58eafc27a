//! Data models for the portal fetcher.

mod config;
mod credential;
mod records;

pub use config::{
    CacheConfig, Config, DiagnosticsConfig, DriverConfig, PortalConfig, parse_window_size,
};
pub use credential::{Credential, derive_cache_key};
pub use records::{
    AuthOutcome, ClassRecord, DeadlineRecord, DegreeIdentity, ExamRecord, GradeReport,
    GradeSummary, Overview, ScrapeResult, Site,
};
