//! Book catalog: store abstraction and the service built on it.
//!
//! Per item the lifecycle is `absent -> present -> absent`. Every mutation
//! is an atomic check-then-act inside the store; the service only turns
//! store results into outcomes.

pub mod memory;
pub mod postgres;
pub mod service;

use async_trait::async_trait;
use rust_common::StoreError;

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;
pub use service::{BookOutcome, CatalogService, ListPage, PageRequest};

/// A catalog entry keyed by a caller-supplied id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Unique id chosen by the caller
    pub id: String,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
}

impl Book {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

/// One slice of an ordered scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Items in ascending id order
    pub items: Vec<Book>,
    /// Size of the whole store at scan time
    pub total: u64,
}

/// Persistent book records.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert unless the id exists. Returns whether a row was written.
    async fn insert_if_absent(&self, book: &Book) -> Result<bool, StoreError>;

    /// Replace title and author of an existing id. Returns whether a row matched.
    async fn update_if_present(&self, book: &Book) -> Result<bool, StoreError>;

    /// Remove an existing id. Returns whether a row matched.
    async fn delete_if_present(&self, id: &str) -> Result<bool, StoreError>;

    /// Items ordered by id, skipping `offset` and taking at most `limit`.
    async fn scan(&self, offset: u64, limit: u64) -> Result<Page, StoreError>;
}
