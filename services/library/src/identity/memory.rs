//! In-memory identity store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_common::StoreError;

use super::{Creation, IdentityStore, User};

#[derive(Debug, Default)]
struct Users {
    next_id: i64,
    by_username: HashMap<String, User>,
}

/// Map-backed store. Each mutation holds the write lock for its whole
/// check-then-act, so uniqueness behaves like the relational constraint.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    users: RwLock<Users>,
    unavailable: AtomicBool,
}

impl MemoryIdentityStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a user behind the service's back.
    pub fn remove(&self, username: &str) -> Option<User> {
        self.users.write().by_username.remove(username)
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().by_username.len()
    }

    /// True when no user is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("identity store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.users.read().by_username.contains_key(username))
    }

    async fn create(
        &self,
        username: &str,
        password_digest: &str,
    ) -> Result<Creation, StoreError> {
        self.check_available()?;
        let mut users = self.users.write();
        if users.by_username.contains_key(username) {
            return Ok(Creation::Duplicate);
        }
        users.next_id += 1;
        let user = User {
            id: users.next_id,
            username: username.to_string(),
            password_digest: password_digest.to_string(),
        };
        users.by_username.insert(username.to_string(), user.clone());
        Ok(Creation::Created(user))
    }

    async fn find(&self, id: i64, username: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self
            .users
            .read()
            .by_username
            .get(username)
            .filter(|user| user.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.users.read().by_username.get(username).cloned())
    }
}
