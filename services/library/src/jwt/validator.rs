//! Token validator for HS256 bearer tokens.
//!
//! Runs the full typestate pipeline: parse, verify signature, check claims.
//! Any failure yields no claims.

use chrono::Utc;
use jsonwebtoken::DecodingKey;

use crate::error::LibraryError;
use crate::jwt::claims::Claims;
use crate::jwt::token::{Token, Unvalidated, Validated};

/// Validates tokens minted by [`crate::jwt::TokenIssuer`] with the same secret.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    issuer: String,
}

impl TokenValidator {
    /// Creates a validator for tokens signed with `secret` by `issuer`.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    /// Validates a token using the type-state pattern at an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Token::parse`], [`Token::validate_signature`] and
    /// [`Token::validate_claims`].
    pub fn validate_token(&self, raw_token: &str, now: i64) -> Result<Token<Validated>, LibraryError> {
        Token::<Unvalidated>::parse(raw_token)?
            .validate_signature(&self.key)?
            .validate_claims(&self.issuer, now)
    }

    /// Validates `raw_token` against the current time and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a `LibraryError`.
    pub fn validate(&self, raw_token: &str) -> Result<Claims, LibraryError> {
        self.validate_at(raw_token, Utc::now().timestamp())
    }

    /// Same as [`Self::validate`] with the clock supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a `LibraryError`.
    pub fn validate_at(&self, raw_token: &str, now: i64) -> Result<Claims, LibraryError> {
        self.validate_token(raw_token, now)?.into_claims()
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
