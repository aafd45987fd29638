//! In-memory catalog store for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_common::StoreError;

use super::{Book, CatalogStore, Page};

/// Ordered map backed store; one write lock per mutation.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    books: RwLock<BTreeMap<String, Book>>,
    unavailable: AtomicBool,
}

impl MemoryCatalogStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored book by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Book> {
        self.books.read().get(id).cloned()
    }

    /// All books in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Book> {
        self.books.read().values().cloned().collect()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("catalog store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_if_absent(&self, book: &Book) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut books = self.books.write();
        if books.contains_key(&book.id) {
            return Ok(false);
        }
        books.insert(book.id.clone(), book.clone());
        Ok(true)
    }

    async fn update_if_present(&self, book: &Book) -> Result<bool, StoreError> {
        self.check_available()?;
        match self.books.write().get_mut(&book.id) {
            Some(existing) => {
                existing.title.clone_from(&book.title);
                existing.author.clone_from(&book.author);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_if_present(&self, id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.books.write().remove(id).is_some())
    }

    async fn scan(&self, offset: u64, limit: u64) -> Result<Page, StoreError> {
        self.check_available()?;
        let books = self.books.read();
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(Page {
            items: books.values().skip(skip).take(take).cloned().collect(),
            total: books.len() as u64,
        })
    }
}
