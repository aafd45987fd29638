use futures::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{error, instrument};
use uuid::Uuid;

use super::correlation_id;
use crate::auth::CallIdentity;
use crate::catalog::service::BookResult;
use crate::catalog::{Book, CatalogService, PageRequest};
use crate::proto::library_service_server::LibraryService;
use crate::proto::{
    self, BatchResponse, BookRequest, BookResponse, ListBookRequest, ListBookResponse,
};

impl From<proto::Book> for Book {
    fn from(book: proto::Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
        }
    }
}

impl From<Book> for proto::Book {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
        }
    }
}

impl From<BookResult> for BookResponse {
    fn from(result: BookResult) -> Self {
        Self {
            message: result.message().to_string(),
            id: result.id,
        }
    }
}

/// Single-item store failures surface as `INTERNAL`; everything else is an
/// ordinary response.
fn single_item_response(
    result: BookResult,
    correlation_id: Uuid,
) -> Result<Response<BookResponse>, Status> {
    if result.outcome.is_store_failure() {
        return Err(Status::internal(format!(
            "{} [correlation_id: {correlation_id}]",
            result.message()
        )));
    }
    Ok(Response::new(result.into()))
}

/// Drain a client stream into the catalog. A receive error aborts the call
/// with `INTERNAL`; per-item outcomes stay in the response.
async fn collect_batch<S>(
    catalog: &CatalogService,
    identity: &CallIdentity,
    books: S,
    correlation_id: Uuid,
) -> Result<BatchResponse, Status>
where
    S: Stream<Item = Result<proto::Book, Status>>,
{
    let results = catalog
        .batch_add(identity, books.map(|item| item.map(Book::from)))
        .await
        .map_err(|status| {
            error!(error = %status, "Batch stream aborted");
            Status::internal(format!(
                "failed to receive book: {} [correlation_id: {correlation_id}]",
                status.message()
            ))
        })?;

    Ok(BatchResponse {
        responses: results.into_iter().map(BookResponse::from).collect(),
    })
}

/// `library.LibraryService`: catalog CRUD, listing and batch ingest.
#[derive(Debug, Clone)]
pub struct LibraryServiceImpl {
    catalog: CatalogService,
}

impl LibraryServiceImpl {
    /// Creates the service.
    #[must_use]
    pub const fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

#[tonic::async_trait]
impl LibraryService for LibraryServiceImpl {
    #[instrument(skip_all, fields(book_id = %request.get_ref().id))]
    async fn add_book(
        &self,
        request: Request<proto::Book>,
    ) -> Result<Response<BookResponse>, Status> {
        let identity = CallIdentity::from_request(&request)?;
        let correlation_id = correlation_id(&request);
        let book = Book::from(request.into_inner());

        single_item_response(self.catalog.add(&identity, &book).await, correlation_id)
    }

    #[instrument(skip_all, fields(book_id = %request.get_ref().id))]
    async fn update_book(
        &self,
        request: Request<proto::Book>,
    ) -> Result<Response<BookResponse>, Status> {
        let identity = CallIdentity::from_request(&request)?;
        let correlation_id = correlation_id(&request);
        let book = Book::from(request.into_inner());

        single_item_response(self.catalog.update(&identity, &book).await, correlation_id)
    }

    #[instrument(skip_all, fields(book_id = %request.get_ref().id))]
    async fn delete_book(
        &self,
        request: Request<BookRequest>,
    ) -> Result<Response<BookResponse>, Status> {
        let identity = CallIdentity::from_request(&request)?;
        let correlation_id = correlation_id(&request);
        let id = request.into_inner().id;

        single_item_response(self.catalog.delete(&identity, &id).await, correlation_id)
    }

    #[instrument(skip_all)]
    async fn list_books(
        &self,
        request: Request<ListBookRequest>,
    ) -> Result<Response<ListBookResponse>, Status> {
        let identity = CallIdentity::from_request(&request)?;
        let correlation_id = correlation_id(&request);
        let ListBookRequest { page, page_size } = request.into_inner();

        let listed = self
            .catalog
            .list(&identity, PageRequest { page, page_size })
            .await
            .map_err(|e| {
                error!(error = %e, "Listing books failed");
                e.to_status(correlation_id)
            })?;

        Ok(Response::new(ListBookResponse {
            books: listed.books.into_iter().map(proto::Book::from).collect(),
            total_count: i32::try_from(listed.total_count).unwrap_or(i32::MAX),
        }))
    }

    #[instrument(skip_all)]
    async fn batch_add_books(
        &self,
        request: Request<Streaming<proto::Book>>,
    ) -> Result<Response<BatchResponse>, Status> {
        let identity = CallIdentity::from_request(&request)?;
        let correlation_id = correlation_id(&request);

        collect_batch(&self.catalog, &identity, request.into_inner(), correlation_id)
            .await
            .map(Response::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tonic::Code;

    use super::*;
    use crate::catalog::MemoryCatalogStore;

    fn wire_book(id: &str) -> proto::Book {
        proto::Book {
            id: id.to_string(),
            title: "Title".to_string(),
            author: "Author".to_string(),
        }
    }

    #[tokio::test]
    async fn test_batch_receive_error_is_internal() {
        let store = Arc::new(MemoryCatalogStore::new());
        let catalog = CatalogService::new(Arc::clone(&store) as _);
        let correlation_id = Uuid::new_v4();
        let items = futures::stream::iter(vec![
            Ok(wire_book("b1")),
            Err(Status::cancelled("client went away")),
            Ok(wire_book("b2")),
        ]);

        let identity = CallIdentity::new(1, "alice");
        let status = collect_batch(&catalog, &identity, items, correlation_id)
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().starts_with("failed to receive book: client went away"));
        assert!(status.message().contains(&correlation_id.to_string()));
        // Items read before the error stay stored; the rest are never read.
        assert!(store.get("b1").is_some());
        assert!(store.get("b2").is_none());
    }

    #[tokio::test]
    async fn test_batch_results_follow_stream_order() {
        let catalog = CatalogService::new(Arc::new(MemoryCatalogStore::new()));
        let items = futures::stream::iter(vec![
            Ok(wire_book("b2")),
            Ok(wire_book("")),
            Ok(wire_book("b2")),
        ]);

        let identity = CallIdentity::new(1, "alice");
        let response = collect_batch(&catalog, &identity, items, Uuid::new_v4())
            .await
            .unwrap();

        let messages: Vec<_> = response
            .responses
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(
            messages,
            ["Book added successfully", "Book ID is required", "Book already exists"]
        );
    }
}
