//! Token minting.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::error::LibraryError;
use crate::jwt::claims::Claims;
use crate::jwt::token::SIGNING_ALGORITHM;

/// Signs fresh tokens for authenticated users.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer signing with `secret`; tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Mints a token for the given subject, issued now.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Internal` if encoding fails.
    pub fn mint(&self, user_id: i64, username: &str) -> Result<String, LibraryError> {
        self.mint_at(user_id, username, Utc::now().timestamp())
    }

    /// Mints a token as if issued at `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Internal` if encoding fails.
    pub fn mint_at(&self, user_id: i64, username: &str, now: i64) -> Result<String, LibraryError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims::new(self.issuer.clone(), user_id, username, now, ttl);
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key)
            .map_err(|e| LibraryError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
