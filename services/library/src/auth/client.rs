//! Client-side credential propagation.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::auth::authenticator::{AUTHORIZATION_KEY, BEARER_PREFIX};
use crate::jwt::TokenWindow;

/// Attaches `authorization: Bearer <token>` to every outgoing call.
///
/// Clones share the token, so a client can log in again and every channel
/// built from this interceptor picks up the new credential.
#[derive(Debug, Clone, Default)]
pub struct BearerInterceptor {
    token: Arc<RwLock<Option<String>>>,
}

impl BearerInterceptor {
    /// Interceptor without a token; calls go out unauthenticated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interceptor holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let interceptor = Self::new();
        interceptor.set_token(token);
        interceptor
    }

    /// Replace the held token.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drop the held token.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Currently held token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// True when there is no usable token or it is within its early-expiry
    /// buffer. The server does not apply the buffer; this only tells the
    /// client to log in again before the hard deadline.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now().timestamp())
    }

    /// [`Self::is_stale`] against an explicit clock.
    #[must_use]
    pub fn is_stale_at(&self, now: i64) -> bool {
        self.token
            .read()
            .as_deref()
            .and_then(|token| TokenWindow::from_unverified(token).ok())
            .is_none_or(|window| window.is_stale_at(now))
    }
}

impl Interceptor for BearerInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(token) = self.token.read().as_deref() {
            let value: MetadataValue<Ascii> = format!("{BEARER_PREFIX}{token}")
                .parse()
                .map_err(|_| Status::invalid_argument("token is not valid metadata"))?;
            request.metadata_mut().insert(AUTHORIZATION_KEY, value);
        }
        Ok(request)
    }
}
