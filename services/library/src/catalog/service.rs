//! Catalog service: single-item CRUD, pagination and batch ingest.
//!
//! Domain outcomes (missing id, duplicate, not found) are ordinary results
//! carrying a message. Store failures on single-item mutations become
//! [`BookOutcome::Failed`], which the RPC layer promotes to `INTERNAL`;
//! inside a batch they stay per-item.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::{Book, CatalogStore};
use crate::auth::CallIdentity;
use crate::error::LibraryError;

/// Page size used when the caller asks for less than one item.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// The mutation a failed outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `AddBook` or a batch entry
    Add,
    /// `UpdateBook`
    Update,
    /// `DeleteBook`
    Delete,
}

/// Result of a single-item catalog operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOutcome {
    /// Inserted
    Added,
    /// Title and author replaced
    Updated,
    /// Removed
    Deleted,
    /// Empty id
    IdRequired,
    /// Insert hit an existing id
    AlreadyExists,
    /// Update or delete of an absent id
    NotFound,
    /// The store failed
    Failed(Mutation),
}

impl BookOutcome {
    /// Response message for this outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Added => "Book added successfully",
            Self::Updated => "Book updated successfully",
            Self::Deleted => "Book deleted successfully",
            Self::IdRequired => "Book ID is required",
            Self::AlreadyExists => "Book already exists",
            Self::NotFound => "Book not found",
            Self::Failed(Mutation::Add) => "Failed to add book",
            Self::Failed(Mutation::Update) => "Failed to update book",
            Self::Failed(Mutation::Delete) => "Failed to delete book",
        }
    }

    /// True when the store rather than the request caused the outcome.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome tagged with the id it concerns (empty when the request had none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookResult {
    /// Id from the request
    pub id: String,
    /// What happened
    pub outcome: BookOutcome,
}

impl BookResult {
    fn new(id: &str, outcome: BookOutcome) -> Self {
        Self {
            id: id.to_string(),
            outcome,
        }
    }

    /// Response message for the outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.outcome.message()
    }
}

/// Raw pagination input as received on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: i32,
    /// Items per page
    pub page_size: i32,
}

impl PageRequest {
    /// `(offset, limit)` after clamping `page < 1` to 1 and `page_size < 1` to the default.
    #[must_use]
    pub fn window(&self) -> (u64, u64) {
        let page = u64::try_from(self.page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let size = u64::try_from(self.page_size)
            .ok()
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        ((page - 1).saturating_mul(size), size)
    }
}

/// One page of books plus the store-wide count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Books in ascending id order
    pub books: Vec<Book>,
    /// Number of books in the whole store
    pub total_count: u64,
}

/// Catalog operations on top of a [`CatalogStore`].
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Insert `book` unless its id is taken.
    pub async fn add(&self, identity: &CallIdentity, book: &Book) -> BookResult {
        if book.id.is_empty() {
            return BookResult::new("", BookOutcome::IdRequired);
        }

        let outcome = match self.store.insert_if_absent(book).await {
            Ok(true) => {
                info!(book_id = %book.id, actor = %identity.username, "Book added");
                BookOutcome::Added
            }
            Ok(false) => BookOutcome::AlreadyExists,
            Err(e) => {
                warn!(book_id = %book.id, error = %e, "Failed to add book");
                BookOutcome::Failed(Mutation::Add)
            }
        };
        BookResult::new(&book.id, outcome)
    }

    /// Replace title and author of an existing book.
    pub async fn update(&self, identity: &CallIdentity, book: &Book) -> BookResult {
        if book.id.is_empty() {
            return BookResult::new("", BookOutcome::IdRequired);
        }

        let outcome = match self.store.update_if_present(book).await {
            Ok(true) => {
                info!(book_id = %book.id, actor = %identity.username, "Book updated");
                BookOutcome::Updated
            }
            Ok(false) => BookOutcome::NotFound,
            Err(e) => {
                warn!(book_id = %book.id, error = %e, "Failed to update book");
                BookOutcome::Failed(Mutation::Update)
            }
        };
        BookResult::new(&book.id, outcome)
    }

    /// Remove a book by id.
    pub async fn delete(&self, identity: &CallIdentity, id: &str) -> BookResult {
        if id.is_empty() {
            return BookResult::new("", BookOutcome::IdRequired);
        }

        let outcome = match self.store.delete_if_present(id).await {
            Ok(true) => {
                info!(book_id = %id, actor = %identity.username, "Book deleted");
                BookOutcome::Deleted
            }
            Ok(false) => BookOutcome::NotFound,
            Err(e) => {
                warn!(book_id = %id, error = %e, "Failed to delete book");
                BookOutcome::Failed(Mutation::Delete)
            }
        };
        BookResult::new(id, outcome)
    }

    /// One page in ascending id order.
    ///
    /// # Errors
    ///
    /// `LibraryError::Store` when the scan fails.
    pub async fn list(
        &self,
        identity: &CallIdentity,
        request: PageRequest,
    ) -> Result<ListPage, LibraryError> {
        let (offset, limit) = request.window();
        let page = self.store.scan(offset, limit).await?;
        debug!(
            actor = %identity.username,
            offset,
            limit,
            returned = page.items.len(),
            total = page.total,
            "Books listed"
        );
        Ok(ListPage {
            books: page.items,
            total_count: page.total,
        })
    }

    /// Add every book from `books` in receipt order, one result per item.
    ///
    /// Items are processed sequentially. Per-item failures never stop the
    /// batch; an `Err` from the stream itself aborts it and discards the
    /// results gathered so far.
    ///
    /// # Errors
    ///
    /// The first error yielded by `books`.
    pub async fn batch_add<S, E>(
        &self,
        identity: &CallIdentity,
        books: S,
    ) -> Result<Vec<BookResult>, E>
    where
        S: Stream<Item = Result<Book, E>>,
    {
        let mut books = std::pin::pin!(books);
        let mut results = Vec::new();

        while let Some(item) = books.next().await {
            let book = item?;
            results.push(self.add(identity, &book).await);
        }

        info!(
            actor = %identity.username,
            received = results.len(),
            added = results.iter().filter(|r| r.outcome == BookOutcome::Added).count(),
            "Batch add finished"
        );
        Ok(results)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalogStore;

    fn identity() -> CallIdentity {
        CallIdentity::new(1, "alice")
    }

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(PageRequest { page: 0, page_size: 0 }.window(), (0, 10));
        assert_eq!(PageRequest { page: -3, page_size: -1 }.window(), (0, 10));
        assert_eq!(PageRequest { page: 3, page_size: 5 }.window(), (10, 5));
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_without_store_access() {
        let store = Arc::new(MemoryCatalogStore::new());
        store.set_unavailable(true);
        let service = CatalogService::new(store);

        let result = service.add(&identity(), &Book::new("", "T", "A")).await;
        assert_eq!(result.outcome, BookOutcome::IdRequired);
        assert_eq!(result.id, "");
        assert_eq!(result.message(), "Book ID is required");
    }

    #[tokio::test]
    async fn test_store_failure_becomes_failed_outcome() {
        let store = Arc::new(MemoryCatalogStore::new());
        store.set_unavailable(true);
        let service = CatalogService::new(store);

        let result = service.update(&identity(), &Book::new("b1", "T", "A")).await;
        assert!(result.outcome.is_store_failure());
        assert_eq!(result.message(), "Failed to update book");
    }

    #[tokio::test]
    async fn test_batch_aborts_on_stream_error() {
        let service = CatalogService::new(Arc::new(MemoryCatalogStore::new()));
        let items = futures::stream::iter(vec![
            Ok(Book::new("b1", "T", "A")),
            Err("connection reset"),
            Ok(Book::new("b2", "T", "A")),
        ]);
        let result = service.batch_add(&identity(), items).await;
        assert_eq!(result, Err("connection reset"));
    }
}
