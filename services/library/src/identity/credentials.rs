//! Credential issuer: registration and login.

use std::sync::Arc;

use tracing::{info, warn};

use super::{Creation, IdentityStore};
use crate::error::LibraryError;
use crate::jwt::TokenIssuer;
use crate::password::SecretHasher;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// User stored and token minted
    Registered {
        /// Bearer token for the new user
        token: String,
    },
    /// Username or password empty
    MissingFields,
    /// Username taken
    AlreadyExists,
}

impl RegisterOutcome {
    /// Response message for this outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "User registered successfully",
            Self::MissingFields => MISSING_FIELDS,
            Self::AlreadyExists => "Username already exists",
        }
    }

    /// Token, empty unless registration succeeded.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Registered { token } => token,
            Self::MissingFields | Self::AlreadyExists => "",
        }
    }
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials verified and token minted
    LoggedIn {
        /// Fresh bearer token
        token: String,
    },
    /// Username or password empty
    MissingFields,
    /// Unknown user or wrong password; the two are not distinguished
    InvalidCredentials,
}

impl LoginOutcome {
    /// Response message for this outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::LoggedIn { .. } => "Login successful",
            Self::MissingFields => MISSING_FIELDS,
            Self::InvalidCredentials => "Invalid username or password",
        }
    }

    /// Token, empty unless login succeeded.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::LoggedIn { token } => token,
            Self::MissingFields | Self::InvalidCredentials => "",
        }
    }
}

const MISSING_FIELDS: &str = "Username and password are required";

/// Hashes passwords, persists users and mints tokens.
#[derive(Clone)]
pub struct CredentialIssuer {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn SecretHasher>,
    tokens: TokenIssuer,
}

impl CredentialIssuer {
    /// Creates an issuer over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn SecretHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register `username` with `password`.
    ///
    /// # Errors
    ///
    /// Store, hashing and minting failures. Business outcomes are `Ok`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterOutcome, LibraryError> {
        if username.is_empty() || password.is_empty() {
            return Ok(RegisterOutcome::MissingFields);
        }

        if self.store.exists(username).await? {
            return Ok(RegisterOutcome::AlreadyExists);
        }

        let digest = self.hash(password).await?;

        // The unique constraint settles concurrent registrations of one name.
        match self.store.create(username, &digest).await? {
            Creation::Created(user) => {
                let token = self.tokens.mint(user.id, &user.username)?;
                info!(user_id = user.id, username = %user.username, "User registered");
                Ok(RegisterOutcome::Registered { token })
            }
            Creation::Duplicate => Ok(RegisterOutcome::AlreadyExists),
        }
    }

    /// Verify credentials and mint a fresh token.
    ///
    /// # Errors
    ///
    /// Store, digest and minting failures. Business outcomes are `Ok`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, LibraryError> {
        if username.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::MissingFields);
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(username, "Login for unknown user");
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if !self.verify(&user.password_digest, password).await? {
            warn!(user_id = user.id, "Login with wrong password");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let token = self.tokens.mint(user.id, &user.username)?;
        info!(user_id = user.id, username = %user.username, "User logged in");
        Ok(LoginOutcome::LoggedIn { token })
    }

    // Argon2 is CPU bound; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String, LibraryError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| LibraryError::Internal(e.into()))?
    }

    async fn verify(&self, digest: &str, password: &str) -> Result<bool, LibraryError> {
        let hasher = Arc::clone(&self.hasher);
        let digest = digest.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| LibraryError::Internal(e.into()))?
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use argon2::Params;

    use super::*;
    use crate::identity::MemoryIdentityStore;
    use crate::jwt::TokenValidator;
    use crate::password::Argon2Hasher;

    const SECRET: &[u8] = b"credential-test-secret";

    fn issuer(store: Arc<MemoryIdentityStore>) -> CredentialIssuer {
        CredentialIssuer::new(
            store,
            Arc::new(Argon2Hasher::with_params(Params::new(8, 1, 1, None).unwrap())),
            TokenIssuer::new(SECRET, "library-service", Duration::from_secs(3600)),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = Arc::new(MemoryIdentityStore::new());
        let issuer = issuer(Arc::clone(&store));
        let validator = TokenValidator::new(SECRET, "library-service");

        let registered = issuer.register("alice", "pw").await.unwrap();
        assert_eq!(registered.message(), "User registered successfully");
        let claims = validator.validate(registered.token()).unwrap();
        assert_eq!(claims.username, "alice");

        let login = issuer.login("alice", "pw").await.unwrap();
        assert_eq!(login.message(), "Login successful");
        assert_ne!(login.token(), registered.token());
        assert!(validator.validate(login.token()).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = Arc::new(MemoryIdentityStore::new());
        let issuer = issuer(Arc::clone(&store));
        issuer.register("alice", "pw").await.unwrap();
        let again = issuer.register("alice", "other").await.unwrap();
        assert_eq!(again, RegisterOutcome::AlreadyExists);
        assert_eq!(again.token(), "");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fields() {
        let issuer = issuer(Arc::new(MemoryIdentityStore::new()));
        assert_eq!(
            issuer.register("", "pw").await.unwrap(),
            RegisterOutcome::MissingFields
        );
        assert_eq!(
            issuer.login("alice", "").await.unwrap().message(),
            "Username and password are required"
        );
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_alike() {
        let store = Arc::new(MemoryIdentityStore::new());
        let issuer = issuer(Arc::clone(&store));
        issuer.register("alice", "pw").await.unwrap();

        let unknown = issuer.login("bob", "pw").await.unwrap();
        let wrong = issuer.login("alice", "nope").await.unwrap();
        assert_eq!(unknown, LoginOutcome::InvalidCredentials);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn test_store_failure_is_error() {
        let store = Arc::new(MemoryIdentityStore::new());
        store.set_unavailable(true);
        let result = issuer(store).register("alice", "pw").await;
        assert!(matches!(result, Err(LibraryError::Store(_))));
    }
}
