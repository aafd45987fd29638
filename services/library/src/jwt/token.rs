//! Type-State JWT Token with compile-time validation guarantees
//!
//! This module implements the type-state pattern for JWT validation,
//! ensuring that claims can only be accessed on fully validated tokens.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};

use crate::error::LibraryError;
use crate::jwt::claims::Claims;

/// The only algorithm tokens may be signed with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Sealed Trait Pattern for Token States
// ============================================================================

mod private {
    /// Sealed trait to prevent external implementations
    pub trait Sealed {}
}

/// Marker trait for token validation states
pub trait TokenState: private::Sealed {
    /// Human-readable state name for debugging
    fn state_name() -> &'static str;
}

/// Unvalidated token - just parsed, not verified
#[derive(Debug)]
pub struct Unvalidated;
impl private::Sealed for Unvalidated {}
impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

/// Signature validated - cryptographic verification passed
#[derive(Debug)]
pub struct SignatureValidated;
impl private::Sealed for SignatureValidated {}
impl TokenState for SignatureValidated {
    fn state_name() -> &'static str {
        "SignatureValidated"
    }
}

/// Fully validated - signature + claims verified
#[derive(Debug)]
pub struct Validated;
impl private::Sealed for Validated {}
impl TokenState for Validated {
    fn state_name() -> &'static str {
        "Validated"
    }
}

// ============================================================================
// Type-State Token Wrapper
// ============================================================================

/// Type-state token wrapper that enforces validation at compile time.
///
/// Claims are decoded during signature verification and are only exposed
/// once the token reaches [`Validated`].
#[derive(Debug)]
pub struct Token<State: TokenState> {
    /// Raw JWT string
    raw: String,
    /// Parsed header (available in all states)
    header: Header,
    /// Decoded claims, empty until the signature is verified
    claims: Option<Claims>,
    /// Phantom marker for state
    _state: PhantomData<State>,
}

impl Token<Unvalidated> {
    /// Parse a raw JWT string into an unvalidated token.
    ///
    /// # Errors
    ///
    /// `TokenMalformed` when the header cannot be decoded or names an
    /// algorithm other than HS256.
    pub fn parse(raw: &str) -> Result<Self, LibraryError> {
        let header = decode_header(raw).map_err(|e| LibraryError::TokenMalformed {
            reason: format!("invalid header: {e}"),
        })?;

        if header.alg != SIGNING_ALGORITHM {
            return Err(LibraryError::TokenMalformed {
                reason: format!("unexpected signing algorithm {:?}", header.alg),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            header,
            claims: None,
            _state: PhantomData,
        })
    }

    /// Get the algorithm from the token header
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Verify the signature against `key`.
    ///
    /// Temporal and issuer checks are deliberately disabled here; they run in
    /// [`Token::validate_claims`] against an explicit clock.
    ///
    /// # Errors
    ///
    /// `TokenInvalid` on a signature mismatch, `TokenMalformed` when the
    /// payload does not decode into [`Claims`].
    pub fn validate_signature(
        self,
        key: &DecodingKey,
    ) -> Result<Token<SignatureValidated>, LibraryError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(&self.raw, key, &validation)?;

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: Some(token_data.claims),
            _state: PhantomData,
        })
    }
}

impl Token<SignatureValidated> {
    /// Validate claims at `now` (unix seconds) and transition to fully validated state.
    ///
    /// # Errors
    ///
    /// `TokenExpired` once `now >= exp`, `TokenNotYetValid` while `now < nbf`,
    /// `ClaimsInvalid` for a foreign issuer or an inconsistent payload.
    pub fn validate_claims(
        self,
        expected_issuer: &str,
        now: i64,
    ) -> Result<Token<Validated>, LibraryError> {
        let claims = self
            .claims
            .as_ref()
            .ok_or_else(|| LibraryError::TokenMalformed {
                reason: "claims not available".to_string(),
            })?;

        if claims.is_expired_at(now) {
            return Err(LibraryError::TokenExpired {
                expired_at: timestamp(claims.exp),
            });
        }

        if now < claims.nbf {
            return Err(LibraryError::TokenNotYetValid {
                valid_from: timestamp(claims.nbf),
            });
        }

        let mut rejected = Vec::new();
        if claims.iss != expected_issuer {
            rejected.push("iss".to_string());
        }
        if claims.exp <= claims.iat {
            rejected.push("exp".to_string());
        }
        if claims.sub != claims.user_id.to_string() {
            rejected.push("sub".to_string());
        }
        if claims.username.is_empty() {
            rejected.push("username".to_string());
        }
        if !rejected.is_empty() {
            return Err(LibraryError::ClaimsInvalid { claims: rejected });
        }

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: self.claims,
            _state: PhantomData,
        })
    }

    /// Get read-only access to claims (signature validated but not fully validated)
    #[must_use]
    pub const fn peek_claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }
}

impl Token<Validated> {
    /// Consume the token and hand out its claims.
    ///
    /// # Errors
    ///
    /// Unreachable in practice: a validated token always carries claims.
    pub fn into_claims(self) -> Result<Claims, LibraryError> {
        self.claims.ok_or_else(|| LibraryError::TokenMalformed {
            reason: "claims not available".to_string(),
        })
    }

    /// Access claims - only available on fully validated tokens
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Get the raw token string
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

// Common methods for all states
impl<S: TokenState> Token<S> {
    /// Get the current state name
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, encode};

    const SECRET: &[u8] = b"token-state-test-secret";
    const ISSUER: &str = "library-service";

    fn sign(claims: &Claims, alg: Algorithm) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn key() -> DecodingKey {
        DecodingKey::from_secret(SECRET)
    }

    #[test]
    fn test_state_transitions() {
        let claims = Claims::new(ISSUER, 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS256);

        let parsed = Token::parse(&raw).unwrap();
        assert_eq!(parsed.state_name(), "Unvalidated");
        assert_eq!(parsed.algorithm(), SIGNING_ALGORITHM);

        let signed = parsed.validate_signature(&key()).unwrap();
        assert_eq!(signed.state_name(), "SignatureValidated");
        assert_eq!(signed.peek_claims(), Some(&claims));

        let validated = signed.validate_claims(ISSUER, 1_001).unwrap();
        assert_eq!(validated.state_name(), "Validated");
        assert_eq!(validated.raw(), raw);
        assert_eq!(validated.claims(), Some(&claims));
        assert_eq!(validated.into_claims().unwrap(), claims);
    }

    #[test]
    fn test_rejects_other_hmac_algorithm() {
        let claims = Claims::new(ISSUER, 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS512);
        assert!(matches!(
            Token::parse(&raw),
            Err(LibraryError::TokenMalformed { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Token::parse("not.a.token"),
            Err(LibraryError::TokenMalformed { .. })
        ));
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let claims = Claims::new(ISSUER, 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS256);
        let result = Token::parse(&raw)
            .unwrap()
            .validate_signature(&DecodingKey::from_secret(b"another-secret"));
        assert!(matches!(result, Err(LibraryError::TokenInvalid)));
    }

    #[test]
    fn test_expired_at_deadline() {
        let claims = Claims::new(ISSUER, 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS256);
        let result = Token::parse(&raw)
            .unwrap()
            .validate_signature(&key())
            .unwrap()
            .validate_claims(ISSUER, 1_600);
        assert!(matches!(result, Err(LibraryError::TokenExpired { .. })));
    }

    #[test]
    fn test_not_yet_valid() {
        let claims = Claims::new(ISSUER, 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS256);
        let result = Token::parse(&raw)
            .unwrap()
            .validate_signature(&key())
            .unwrap()
            .validate_claims(ISSUER, 999);
        assert!(matches!(result, Err(LibraryError::TokenNotYetValid { .. })));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let claims = Claims::new("someone-else", 1, "alice", 1_000, 600);
        let raw = sign(&claims, Algorithm::HS256);
        let result = Token::parse(&raw)
            .unwrap()
            .validate_signature(&key())
            .unwrap()
            .validate_claims(ISSUER, 1_001);
        match result {
            Err(LibraryError::ClaimsInvalid { claims }) => assert_eq!(claims, vec!["iss"]),
            other => panic!("expected ClaimsInvalid, got {other:?}"),
        }
    }
}
