//! Password hashing and verification using Argon2id
//!
//! The rest of the service treats hashing as an opaque capability behind
//! [`SecretHasher`]: `hash(secret) -> digest` and `verify(digest, secret) -> bool`.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::LibraryError;

/// One-way secret hashing.
pub trait SecretHasher: Send + Sync {
    /// Produce a self-describing digest of `secret`.
    ///
    /// # Errors
    ///
    /// `LibraryError::PasswordHash` when hashing fails.
    fn hash(&self, secret: &str) -> Result<String, LibraryError>;

    /// Check `secret` against a digest produced by [`SecretHasher::hash`].
    ///
    /// # Errors
    ///
    /// `LibraryError::PasswordHash` when the digest cannot be parsed. A
    /// mismatch is `Ok(false)`, not an error.
    fn verify(&self, digest: &str, secret: &str) -> Result<bool, LibraryError>;
}

/// Argon2id hasher producing PHC-formatted digests.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Hasher with the crate's default Argon2id cost.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Hasher with explicit cost parameters (tests use a cheap profile).
    #[must_use]
    pub const fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, LibraryError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LibraryError::PasswordHash(e.to_string()))
    }

    fn verify(&self, digest: &str, secret: &str) -> Result<bool, LibraryError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| LibraryError::PasswordHash(format!("invalid digest format: {e}")))?;

        // Parameters are read from the digest itself.
        match self.argon2().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(LibraryError::PasswordHash(e.to_string())),
        }
    }
}
