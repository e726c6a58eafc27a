// src/lib.rs

//! unifetch Library
//!
//! Browser-driven fetcher for university portals: SSO login, heuristic
//! HTML extraction and a credential-keyed result cache.

pub mod auth;
pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod portals;
pub mod session;
pub mod utils;

pub use error::{Result, ScrapeError};
pub use fetch::Fetcher;
