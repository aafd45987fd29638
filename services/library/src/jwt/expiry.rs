//! Client-side early-expiry check.
//!
//! A client stops using its token slightly before the server would reject
//! it: `buffer = min(30s, lifetime / 10)`. The server never applies this
//! buffer; it enforces only the hard deadline.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::LibraryError;

/// Upper bound on the early-expiry buffer.
pub const MAX_EXPIRY_BUFFER: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct Window {
    iat: i64,
    exp: i64,
}

/// Issue and expiry instants read from a token without verifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindow {
    /// Issued-at, unix seconds
    pub issued_at: i64,
    /// Expiry, unix seconds
    pub expires_at: i64,
}

impl TokenWindow {
    /// Reads `iat`/`exp` from the payload segment. No signature check happens
    /// here; the result is advisory.
    ///
    /// # Errors
    ///
    /// `TokenMalformed` when the token does not have three segments or the
    /// payload is not the expected JSON.
    pub fn from_unverified(token: &str) -> Result<Self, LibraryError> {
        let mut parts = token.split('.');
        let (Some(_), Some(payload), Some(_), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(LibraryError::TokenMalformed {
                reason: "invalid token format".to_string(),
            });
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| LibraryError::TokenMalformed {
                reason: e.to_string(),
            })?;
        let window: Window =
            serde_json::from_slice(&bytes).map_err(|e| LibraryError::TokenMalformed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            issued_at: window.iat,
            expires_at: window.exp,
        })
    }

    /// `min(30s, lifetime / 10)`, in whole seconds.
    #[must_use]
    pub fn buffer_seconds(&self) -> i64 {
        let lifetime = self.expires_at.saturating_sub(self.issued_at).max(0);
        let cap = i64::try_from(MAX_EXPIRY_BUFFER.as_secs()).unwrap_or(i64::MAX);
        (lifetime / 10).min(cap)
    }

    /// True once `now >= exp - buffer`.
    #[must_use]
    pub fn is_stale_at(&self, now: i64) -> bool {
        now >= self.expires_at.saturating_sub(self.buffer_seconds())
    }
}
