//! Per-call authorization protocol.
//!
//! 1. Look the method up in the policy table; public methods pass untouched.
//! 2. Extract `authorization: Bearer <token>` from the call metadata.
//! 3. Validate the token (signature, algorithm, expiry, issuer).
//! 4. Re-read the identity store for a row matching both subject id and
//!    username. A valid signature alone is not enough: deleted users lose
//!    access immediately. A lookup that cannot complete rejects the call
//!    the same way a missing row does.
//!
//! Streams run this once, when the stream is established. A stream that
//! starts authenticated stays authenticated even if its token expires or
//! its user is deleted mid-stream. Keeping the check off the per-message
//! path trades that window for one store read per stream.

use std::sync::Arc;

use tonic::metadata::MetadataMap;
use tracing::debug;

use crate::auth::identity::CallIdentity;
use crate::auth::policy::{MethodPolicy, PolicyTable};
use crate::error::LibraryError;
use crate::identity::IdentityStore;
use crate::jwt::TokenValidator;

/// Metadata key carrying the bearer credential.
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Scheme prefix of the credential value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// What the authenticator decided for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Method is public; nothing attached
    Public,
    /// Caller verified
    Authenticated(CallIdentity),
}

/// Validates credentials and revalidates subjects. Performs no writes.
#[derive(Clone)]
pub struct Authenticator {
    validator: TokenValidator,
    identities: Arc<dyn IdentityStore>,
    policy: Arc<PolicyTable>,
}

impl Authenticator {
    /// Creates an authenticator.
    #[must_use]
    pub fn new(
        validator: TokenValidator,
        identities: Arc<dyn IdentityStore>,
        policy: PolicyTable,
    ) -> Self {
        Self {
            validator,
            identities,
            policy: Arc::new(policy),
        }
    }

    /// Decide whether a call to `path` carrying `metadata` may proceed.
    ///
    /// # Errors
    ///
    /// Credential, token and revalidation failures, all of which map to
    /// `UNAUTHENTICATED`. An identity store failure surfaces as
    /// `LibraryError::SubjectLookupFailed`.
    pub async fn authorize(
        &self,
        path: &str,
        metadata: &MetadataMap,
    ) -> Result<Decision, LibraryError> {
        if self.policy.policy_for(path) == MethodPolicy::Public {
            return Ok(Decision::Public);
        }

        let token = bearer_token(metadata)?;
        let claims = self.validator.validate(token)?;

        let user = self
            .identities
            .find(claims.user_id, &claims.username)
            .await
            .map_err(|source| LibraryError::SubjectLookupFailed { source })?
            .ok_or_else(|| LibraryError::SubjectNotFound {
                subject_id: claims.user_id,
                username: claims.username.clone(),
            })?;

        debug!(user_id = user.id, username = %user.username, "Caller authenticated");
        Ok(Decision::Authenticated(CallIdentity::new(
            user.id,
            user.username,
        )))
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("validator", &self.validator)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Token from `authorization: Bearer <token>`.
///
/// # Errors
///
/// `CredentialMissing` when the entry is absent, not ASCII, or not a bearer credential.
pub fn bearer_token(metadata: &MetadataMap) -> Result<&str, LibraryError> {
    let value = metadata
        .get(AUTHORIZATION_KEY)
        .ok_or(LibraryError::CredentialMissing {
            reason: "missing authorization header",
        })?;

    let value = value.to_str().map_err(|_| LibraryError::CredentialMissing {
        reason: "authorization header is not valid ASCII",
    })?;

    value
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .ok_or(LibraryError::CredentialMissing {
            reason: "invalid authorization header format",
        })
}
