//! Signed session-id cookie.
//!
//! The session id travels as an HS256-signed token so a client cannot forge
//! or swap ids. When the signing secret is ephemeral (not configured),
//! cookies stop verifying after a restart and the bearer simply gets a
//! fresh session.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "naru_session";

/// Cookie lifetime in days.
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Session ID (subject).
    sub: String,
    /// Expiration time (UNIX timestamp).
    exp: usize,
}

/// Issues and verifies signed session-id tokens.
#[derive(Clone)]
pub struct CookieSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish()
    }
}

impl CookieSigner {
    /// Create a signer from the session secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a session id into a cookie value.
    #[must_use]
    pub fn issue(&self, session_id: &str) -> Option<String> {
        let exp = Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS);
        let claims = SessionClaims {
            sub: session_id.to_string(),
            exp: usize::try_from(exp.timestamp()).ok()?,
        };
        match encode(&Header::default(), &claims, &self.encoding) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "failed to sign session cookie");
                None
            }
        }
    }

    /// Verify a cookie value, returning the session id it carries.
    ///
    /// Tampered, expired, or foreign-key tokens all return `None`; the
    /// caller responds by issuing a fresh session.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<String> {
        let validation = Validation::default();
        match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "session cookie failed verification");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_verify_roundtrip() {
        let signer = CookieSigner::new("a-test-secret");
        let token = signer.issue("session-1").unwrap();
        assert_eq!(signer.verify(&token).as_deref(), Some("session-1"));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let signer = CookieSigner::new("a-test-secret");
        let other = CookieSigner::new("another-secret");
        let token = signer.issue("session-1").unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn garbage_fails_verification() {
        let signer = CookieSigner::new("a-test-secret");
        assert!(signer.verify("not-a-token").is_none());
        assert!(signer.verify("").is_none());
    }
}
