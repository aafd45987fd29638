//! Verified caller identity.

use tonic::{Request, Status};

/// Subject of a successfully authorized call.
///
/// Lives in the request extensions for exactly one call; handlers pull it out
/// with [`CallIdentity::from_request`] and pass it on explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallIdentity {
    /// User id from the token, confirmed against the store
    pub subject_id: i64,
    /// Username from the token, confirmed against the store
    pub username: String,
}

impl CallIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(subject_id: i64, username: impl Into<String>) -> Self {
        Self {
            subject_id,
            username: username.into(),
        }
    }

    /// Identity attached to `request` by the auth layer.
    ///
    /// # Errors
    ///
    /// `UNAUTHENTICATED` when no identity is attached, i.e. the handler is
    /// being served without the auth layer in front of it.
    pub fn from_request<T>(request: &Request<T>) -> Result<Self, Status> {
        request
            .extensions()
            .get::<Self>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("user not authenticated"))
    }
}
