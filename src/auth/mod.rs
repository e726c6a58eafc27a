// src/auth/mod.rs

//! SSO credential injection.
//!
//! All three portals delegate login to the same Shibboleth-style identity
//! provider. The injector drives that shared form: fill credentials, answer
//! an optional TOTP challenge, then wait until the portal takes the session
//! back.

pub mod totp;

use thirtyfour::By;

use crate::error::Result;
use crate::models::{AuthOutcome, Credential};
use crate::session::SessionDriver;
use crate::utils::text::contains_any;

/// Page-source markers for a rejected login, lowercase.
const FAILURE_MARKERS: &[&str] = &["login failed", "fehlgeschlagen"];

/// Page-source markers for a pending second-factor challenge, lowercase.
const CHALLENGE_MARKERS: &[&str] = &[
    "one-time password",
    "second factor",
    "zweiter faktor",
    "sicherheitstoken",
    "security token",
];

/// Page-source marker for a portal maintenance window, lowercase.
const MAINTENANCE_MARKER: &str = "wartungsarbeiten";

fn username_fields() -> Vec<By> {
    vec![
        By::Id("username"),
        By::Name("j_username"),
        By::Id("idToken1"),
        By::Css("input[type='text']"),
        By::Css("input[type='email']"),
    ]
}

fn password_fields() -> Vec<By> {
    vec![
        By::Id("password"),
        By::Name("j_password"),
        By::Id("idToken2"),
        By::Css("input[type='password']"),
    ]
}

fn submit_buttons() -> Vec<By> {
    vec![
        By::Name("_eventId_proceed"),
        By::Id("loginButton_0"),
        By::Css("button[type='submit']"),
        By::Css("input[type='submit']"),
        By::XPath("//button[contains(text(), 'Login') or contains(text(), 'Anmelden')]"),
    ]
}

fn token_fields() -> Vec<By> {
    vec![
        By::Id("token"),
        By::Name("otp"),
        By::Css("input[type='text'][inputmode='numeric']"),
        By::Css("input[type='text']"),
    ]
}

fn token_submit_buttons() -> Vec<By> {
    vec![
        By::Name("_eventId_proceed"),
        By::Css("button[type='submit']"),
    ]
}

/// Drives the shared SSO login form on behalf of one portal.
pub struct CredentialInjector<'a> {
    session: &'a SessionDriver,
}

impl<'a> CredentialInjector<'a> {
    pub fn new(session: &'a SessionDriver) -> Self {
        Self { session }
    }

    /// Run the login flow until a terminal state.
    ///
    /// `origin_marker` is the URL substring that proves the portal has taken
    /// the session back, e.g. "boss.tu-dortmund.de". The caller is expected
    /// to have navigated to the portal entry page already.
    pub async fn login(
        &self,
        credential: &Credential,
        origin_marker: &str,
    ) -> Result<AuthOutcome> {
        let sso_marker = self.session.config().portals.sso_marker.clone();
        let timeout = self.session.wait_timeout();

        if !self.session.wait_for_url_contains(&sso_marker, timeout).await? {
            // Never handed over to the identity provider. Either an earlier
            // session is still valid or the portal is unreachable.
            if self.session.current_url().await?.contains(origin_marker) {
                log::debug!("Session for {origin_marker} still valid, skipping login");
                return Ok(AuthOutcome::Authenticated);
            }
            return Ok(AuthOutcome::Timeout);
        }

        log::debug!("SSO form reached, submitting credentials");
        let username = self.session.wait_for_first(&username_fields()).await?;
        username.clear().await?;
        username.send_keys(credential.identity.as_str()).await?;

        let password = self.session.find_first(&password_fields()).await?;
        password.clear().await?;
        password.send_keys(credential.secret.as_str()).await?;

        self.session.find_first(&submit_buttons()).await?.click().await?;
        self.session.settle().await;

        let source = self.session.source().await?;
        if contains_any(&source, FAILURE_MARKERS) {
            return Ok(AuthOutcome::InvalidCredentials);
        }

        let url = self.session.current_url().await?;
        if url.contains(&sso_marker) && contains_any(&source, CHALLENGE_MARKERS) {
            log::debug!("Second factor challenge detected");
            let Some(seed) = &credential.totp_seed else {
                return Ok(AuthOutcome::SecondFactorRequired);
            };
            let code = totp::generate_code(seed)?;
            let token = self.session.find_first(&token_fields()).await?;
            token.clear().await?;
            token.send_keys(code.as_str()).await?;
            self.session
                .find_first(&token_submit_buttons())
                .await?
                .click()
                .await?;
            self.session.settle().await;

            // A wrong or expired code comes back as a failed login.
            let source = self.session.source().await?;
            if contains_any(&source, FAILURE_MARKERS) {
                return Ok(AuthOutcome::InvalidCredentials);
            }
        }

        if self.session.wait_for_url_contains(origin_marker, timeout).await? {
            let source = self.session.source().await?;
            if contains_any(&source, &[MAINTENANCE_MARKER]) {
                return Ok(AuthOutcome::Maintenance);
            }
            log::info!("Authenticated against {origin_marker}");
            return Ok(AuthOutcome::Authenticated);
        }
        Ok(AuthOutcome::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogues_start_with_the_specific_locator() {
        assert!(format!("{:?}", username_fields()[0]).contains("username"));
        assert!(format!("{:?}", password_fields()[0]).contains("password"));
        assert!(format!("{:?}", submit_buttons()[0]).contains("_eventId_proceed"));
        assert!(format!("{:?}", token_fields()[0]).contains("token"));
    }

    #[test]
    fn failure_markers_are_lowercase() {
        for marker in FAILURE_MARKERS.iter().chain(CHALLENGE_MARKERS) {
            assert_eq!(*marker, marker.to_lowercase().as_str());
        }
    }
}
