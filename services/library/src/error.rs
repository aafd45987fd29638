//! Error handling module with type-safe, non-exhaustive error types
//!
//! Two tiers exist. Everything in [`LibraryError`] is a call-level failure:
//! credential problems collapse to `UNAUTHENTICATED`, store and internal
//! failures to `INTERNAL`. Business outcomes (duplicate id, unknown user, ...)
//! are not errors at all; they travel in response messages.

use chrono::{DateTime, Utc};
use rust_common::StoreError;
use thiserror::Error;
use tonic::{Code, Status};
use uuid::Uuid;

/// Sensitive patterns that should be sanitized from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "key",
    "credential",
    "bearer",
    "authorization",
    "private",
];

/// Non-exhaustive error enum for forward compatibility
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LibraryError {
    /// No usable bearer credential in the call metadata
    #[error("Credential missing: {reason}")]
    CredentialMissing {
        /// Which extraction step failed
        reason: &'static str,
    },

    /// Token signature verification failed
    #[error("Token signature invalid")]
    TokenInvalid,

    /// Token has expired
    #[error("Token expired at {expired_at}")]
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// Token is not yet valid (nbf claim)
    #[error("Token not yet valid until {valid_from}")]
    TokenNotYetValid {
        /// When the token becomes valid
        valid_from: DateTime<Utc>,
    },

    /// Token structure is malformed or uses an unexpected algorithm
    #[error("Token malformed: {reason}")]
    TokenMalformed {
        /// Description of the malformation
        reason: String,
    },

    /// Claims are present but unacceptable
    #[error("Required claims invalid: {claims:?}")]
    ClaimsInvalid {
        /// Names of the rejected claims
        claims: Vec<String>,
    },

    /// The token's subject no longer exists in the identity store
    #[error("Subject {subject_id} ({username}) not found")]
    SubjectNotFound {
        /// Subject id carried by the token
        subject_id: i64,
        /// Username carried by the token
        username: String,
    },

    /// The identity store could not answer the revalidation query
    #[error("Subject lookup failed: {source}")]
    SubjectLookupFailed {
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Password digest could not be produced or parsed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// A store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal error (details sanitized in responses)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error codes for gRPC responses and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Credential missing from metadata
    CredentialMissing,
    /// Bad signature
    TokenInvalid,
    /// Past its expiry
    TokenExpired,
    /// Before its not-before time
    TokenNotYetValid,
    /// Unparseable or wrong algorithm
    TokenMalformed,
    /// Claims rejected
    ClaimsInvalid,
    /// Subject gone from the identity store
    SubjectNotFound,
    /// Identity store unreachable during revalidation
    SubjectLookupFailed,
    /// Store failure
    StoreFailure,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "AUTH_CREDENTIAL_MISSING",
            Self::TokenInvalid => "AUTH_TOKEN_INVALID",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::TokenNotYetValid => "AUTH_TOKEN_NOT_YET_VALID",
            Self::TokenMalformed => "AUTH_TOKEN_MALFORMED",
            Self::ClaimsInvalid => "AUTH_CLAIMS_INVALID",
            Self::SubjectNotFound => "AUTH_SUBJECT_NOT_FOUND",
            Self::SubjectLookupFailed => "AUTH_SUBJECT_LOOKUP_FAILED",
            Self::StoreFailure => "STORE_FAILURE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the gRPC status code for this error.
    ///
    /// Every credential-related failure maps to `Unauthenticated` so a caller
    /// cannot tell which check rejected it.
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::CredentialMissing
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::TokenNotYetValid
            | Self::TokenMalformed
            | Self::ClaimsInvalid
            | Self::SubjectNotFound
            | Self::SubjectLookupFailed => Code::Unauthenticated,
            Self::StoreFailure | Self::Internal => Code::Internal,
        }
    }
}

/// Structured error response with correlation ID
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message (sanitized)
    pub message: String,
    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl ErrorResponse {
    /// Create a new error response from a `LibraryError`
    #[must_use]
    pub fn from_error(error: &LibraryError, correlation_id: Uuid) -> Self {
        let message = match error {
            LibraryError::CredentialMissing { reason } => {
                format!("authentication failed: {reason}")
            }
            LibraryError::TokenInvalid => "invalid token: signature is invalid".to_string(),
            LibraryError::TokenExpired { .. } => "invalid token: token has expired".to_string(),
            LibraryError::TokenNotYetValid { .. } => {
                "invalid token: token is not valid yet".to_string()
            }
            LibraryError::TokenMalformed { reason } => {
                format!("invalid token: {}", sanitize_message(reason))
            }
            LibraryError::ClaimsInvalid { claims } => {
                format!("invalid token: claims rejected {claims:?}")
            }
            LibraryError::SubjectNotFound { .. } => {
                "user validation failed: user not found".to_string()
            }
            LibraryError::SubjectLookupFailed { .. } => {
                "user validation failed: user could not be verified".to_string()
            }
            LibraryError::Store(_) => "Store operation failed".to_string(),
            // Never expose internal error details
            LibraryError::PasswordHash(_) | LibraryError::Internal(_) => {
                "Internal error".to_string()
            }
        };

        Self {
            code: error.code(),
            message,
            correlation_id,
        }
    }

    /// Convert to gRPC Status
    #[must_use]
    pub fn to_status(&self) -> Status {
        let message = format!("{} [correlation_id: {}]", self.message, self.correlation_id);
        Status::new(self.code.grpc_code(), message)
    }
}

impl LibraryError {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CredentialMissing { .. } => ErrorCode::CredentialMissing,
            Self::TokenInvalid => ErrorCode::TokenInvalid,
            Self::TokenExpired { .. } => ErrorCode::TokenExpired,
            Self::TokenNotYetValid { .. } => ErrorCode::TokenNotYetValid,
            Self::TokenMalformed { .. } => ErrorCode::TokenMalformed,
            Self::ClaimsInvalid { .. } => ErrorCode::ClaimsInvalid,
            Self::SubjectNotFound { .. } => ErrorCode::SubjectNotFound,
            Self::SubjectLookupFailed { .. } => ErrorCode::SubjectLookupFailed,
            Self::Store(_) => ErrorCode::StoreFailure,
            Self::PasswordHash(_) | Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True for every failure of the credential path
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(self.code().grpc_code(), Code::Unauthenticated)
    }

    /// True when a store, not the caller, caused the failure.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::SubjectLookupFailed { .. })
    }

    /// Convert to gRPC Status with correlation ID
    #[must_use]
    pub fn to_status(&self, correlation_id: Uuid) -> Status {
        ErrorResponse::from_error(self, correlation_id).to_status()
    }
}

/// Sanitize a message by removing sensitive information
fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "invalid token format".to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
#[must_use]
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

impl From<jsonwebtoken::errors::Error> for LibraryError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired {
                expired_at: Utc::now(),
            },
            ErrorKind::ImmatureSignature => Self::TokenNotYetValid {
                valid_from: Utc::now(),
            },
            ErrorKind::InvalidSignature => Self::TokenInvalid,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::TokenMalformed {
                reason: "unexpected signing algorithm".to_string(),
            },
            ErrorKind::MissingRequiredClaim(claim) => Self::ClaimsInvalid {
                claims: vec![claim.clone()],
            },
            _ => Self::TokenMalformed {
                reason: sanitize_message(&err.to_string()),
            },
        }
    }
}

impl From<sqlx::Error> for LibraryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}
