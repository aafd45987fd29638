use serde::{Deserialize, Serialize};

/// Payload of a library bearer token.
///
/// `sub` repeats `user_id` in string form so generic JWT tooling sees a
/// subject; the typed fields are the ones the service reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    /// Claims for `user_id`/`username` issued at `now`, expiring `ttl_seconds` later.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        user_id: i64,
        username: impl Into<String>,
        now: i64,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: user_id.to_string(),
            user_id,
            username: username.into(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl_seconds),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Hard deadline check; a token is valid only while `now < exp`.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    #[must_use]
    pub const fn lifetime_seconds(&self) -> i64 {
        self.exp.saturating_sub(self.iat)
    }
}
