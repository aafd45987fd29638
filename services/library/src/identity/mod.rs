//! Identity store: username -> user id + password digest.
//!
//! Users are created on registration and never updated by the service. They
//! can disappear out-of-band, which is why every authenticated call looks the
//! subject up again.

pub mod credentials;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_common::StoreError;

pub use credentials::{CredentialIssuer, LoginOutcome, RegisterOutcome};
pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned id
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Opaque digest produced by the password hasher
    pub password_digest: String,
}

/// Result of an insert that respects username uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation {
    /// The row was written
    Created(User),
    /// Another row already holds the username
    Duplicate,
}

/// Persistent user records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// True when a user with `username` exists.
    async fn exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert a user; a concurrent or earlier registration of the same name
    /// yields [`Creation::Duplicate`] rather than an error.
    async fn create(&self, username: &str, password_digest: &str)
    -> Result<Creation, StoreError>;

    /// Row matching both `id` and `username`, if any.
    async fn find(&self, id: i64, username: &str) -> Result<Option<User>, StoreError>;

    /// Row for `username`, if any.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}
