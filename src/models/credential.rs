// src/models/credential.rs

//! Login credentials supplied per request.
//!
//! Credentials are never persisted by this crate. They live for the duration
//! of a single fetch and only a truncated digest of them survives as a
//! cache key.

use std::fmt;

use sha2::{Digest, Sha256};

/// University account credentials for one fetch.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account name as entered on the SSO login form
    pub identity: String,

    /// Account password
    pub secret: String,

    /// Base32-encoded TOTP seed, if the account has a second factor enrolled
    pub totp_seed: Option<String>,
}

impl Credential {
    /// Create a credential without a second factor.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            totp_seed: None,
        }
    }

    /// Attach a TOTP seed for accounts with a second factor enrolled.
    pub fn with_totp_seed(mut self, seed: impl Into<String>) -> Self {
        self.totp_seed = Some(seed.into());
        self
    }

    /// Derive the cache key for this credential.
    ///
    /// The key digests identity and secret together, so a caller presenting
    /// a wrong password can never be served another caller's cached data.
    pub fn cache_key(&self) -> String {
        derive_cache_key(&self.identity, &self.secret)
    }
}

/// First 16 hex characters of sha256("identity:secret").
pub fn derive_cache_key(identity: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .field(
                "totp_seed",
                &self.totp_seed.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_16_hex_chars() {
        let key = Credential::new("mmuster", "hunter2").cache_key();
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_secrets_yield_different_keys() {
        let a = Credential::new("mmuster", "hunter2").cache_key();
        let b = Credential::new("mmuster", "hunter3").cache_key();
        assert_ne!(a, b);
    }

    #[test]
    fn different_identities_yield_different_keys() {
        let a = Credential::new("mmuster", "hunter2").cache_key();
        let b = Credential::new("emusterfrau", "hunter2").cache_key();
        assert_ne!(a, b);
    }

    #[test]
    fn separator_prevents_boundary_collisions() {
        // "ab" + "c" and "a" + "bc" must not collide.
        assert_ne!(derive_cache_key("ab", "c"), derive_cache_key("a", "bc"));
    }

    #[test]
    fn cache_key_is_deterministic() {
        let a = Credential::new("mmuster", "hunter2");
        assert_eq!(a.cache_key(), a.cache_key());
    }

    #[test]
    fn debug_masks_secret_and_seed() {
        let cred = Credential::new("mmuster", "hunter2").with_totp_seed("JBSWY3DPEHPK3PXP");
        let rendered = format!("{cred:?}");
        assert!(rendered.contains("mmuster"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
    }
}
