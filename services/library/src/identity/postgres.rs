//! PostgreSQL identity store.

use std::time::Duration;

use async_trait::async_trait;
use rust_common::{StoreError, with_timeout};
use sqlx::PgPool;
use tracing::debug;

use super::{Creation, IdentityStore, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_digest: row.password_hash,
        }
    }
}

/// `users` table backed store.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgIdentityStore {
    /// Wraps a pool; every query is bounded by `timeout`.
    #[must_use]
    pub const fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        with_timeout(self.timeout, async {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                    .bind(username)
                    .fetch_one(&self.pool)
                    .await?;
            Ok::<_, StoreError>(exists)
        })
        .await
    }

    async fn create(
        &self,
        username: &str,
        password_digest: &str,
    ) -> Result<Creation, StoreError> {
        with_timeout(self.timeout, async {
            let inserted: Option<(i64,)> = sqlx::query_as(
                "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
                 ON CONFLICT (username) DO NOTHING RETURNING id",
            )
            .bind(username)
            .bind(password_digest)
            .fetch_optional(&self.pool)
            .await?;

            let creation = match inserted {
                Some((id,)) => {
                    debug!(user_id = id, username, "User row created");
                    Creation::Created(User {
                        id,
                        username: username.to_string(),
                        password_digest: password_digest.to_string(),
                    })
                }
                None => Creation::Duplicate,
            };
            Ok::<_, StoreError>(creation)
        })
        .await
    }

    async fn find(&self, id: i64, username: &str) -> Result<Option<User>, StoreError> {
        with_timeout(self.timeout, async {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, username, password_hash FROM users WHERE id = $1 AND username = $2",
            )
            .bind(id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(row.map(User::from))
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        with_timeout(self.timeout, async {
            let row: Option<UserRow> =
                sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = $1")
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok::<_, StoreError>(row.map(User::from))
        })
        .await
    }
}
