//! Centralized store error type for all Rust services.
//!
//! Every persistence backend (relational or in-memory) reports failures
//! through [`StoreError`], so callers can classify them without knowing
//! which backend is in use.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Common error type for store operations.
///
/// Errors are classified as either retryable or non-retryable. Nothing in
/// the services retries on its own; the classification is exposed so the
/// caller can decide.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete within the configured bound
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A uniqueness constraint rejected the write
    #[error("Store conflict: {0}")]
    Conflict(String),

    /// Any other store failure
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Check if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::StoreError;
    /// use std::time::Duration;
    ///
    /// assert!(StoreError::Timeout(Duration::from_secs(5)).is_retryable());
    /// assert!(!StoreError::conflict("books_pkey").is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Returns true when a uniqueness constraint rejected the write.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a conflict error with the given message.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::unavailable("connection pool timed out"),
            sqlx::Error::PoolClosed => Self::unavailable("connection pool closed"),
            sqlx::Error::Io(e) => Self::unavailable(e.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::conflict(db.constraint().unwrap_or("unique constraint").to_string())
            }
            other => Self::internal(other.to_string()),
        }
    }
}

/// Runs a store future under a timeout, mapping expiry to [`StoreError::Timeout`].
///
/// # Errors
///
/// Returns the future's own error, or `StoreError::Timeout` when `bound` elapses first.
pub async fn with_timeout<T, F>(bound: Duration, future: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(bound, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(bound)),
    }
}
