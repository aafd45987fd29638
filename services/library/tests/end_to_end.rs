//! End-to-end tests over a loopback gRPC server backed by in-memory stores.

mod common;

use std::time::Duration;

use common::TestServer;
use library_service::auth::BearerInterceptor;
use library_service::proto::{
    Book, BookRequest, ListBookRequest, User, UserCredentials,
};
use test_utils::{SampleUser, sample_books};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Code;

fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: "Author".to_string(),
    }
}

async fn register(server: &TestServer, user: &SampleUser) -> String {
    let response = server
        .user_client()
        .await
        .register(User {
            username: user.username.clone(),
            password: user.password.clone(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.message, "User registered successfully");
    response.token
}

#[tokio::test]
async fn test_revalidation_scenario() {
    let server = TestServer::spawn().await;
    let alice = SampleUser::alice();

    let token_a = register(&server, &alice).await;

    let login = server
        .user_client()
        .await
        .login(UserCredentials {
            username: alice.username.clone(),
            password: alice.password.clone(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(login.message, "Login successful");
    let token_b = login.token;
    assert_ne!(token_a, token_b);

    // Both tokens are accepted.
    let mut with_a = server
        .library_client(BearerInterceptor::with_token(token_a))
        .await;
    assert!(with_a.list_books(ListBookRequest::default()).await.is_ok());

    let mut anonymous = server.library_client(BearerInterceptor::new()).await;
    let status = anonymous
        .add_book(book("b1", "Dune"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let mut with_b = server
        .library_client(BearerInterceptor::with_token(token_b))
        .await;
    let added = with_b.add_book(book("b1", "Dune")).await.unwrap().into_inner();
    assert_eq!(added.id, "b1");
    assert_eq!(added.message, "Book added successfully");

    server.identities.remove(&alice.username);

    let status = with_b.add_book(book("b2", "Emma")).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(server.catalog.get("b2").is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_register_and_login_outcomes() {
    let server = TestServer::spawn().await;
    let mut users = server.user_client().await;

    let missing = users
        .register(User {
            username: String::new(),
            password: "pw".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(missing.message, "Username and password are required");
    assert!(missing.token.is_empty());

    register(&server, &SampleUser::bob()).await;
    let duplicate = users
        .register(User {
            username: "bob".to_string(),
            password: "other".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(duplicate.message, "Username already exists");

    let wrong = users
        .login(UserCredentials {
            username: "bob".to_string(),
            password: "nope".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(wrong.message, "Invalid username or password");
    assert!(wrong.token.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_garbage_token_is_unauthenticated() {
    let server = TestServer::spawn().await;
    let mut client = server
        .library_client(BearerInterceptor::with_token("not-a-token"))
        .await;

    let status = client
        .list_books(ListBookRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(status.message().contains("correlation_id"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_crud_over_the_wire() {
    let server = TestServer::spawn().await;
    let token = register(&server, &SampleUser::unique()).await;
    let mut client = server
        .library_client(BearerInterceptor::with_token(token))
        .await;

    let empty = client.add_book(book("", "Nameless")).await.unwrap().into_inner();
    assert_eq!(empty.id, "");
    assert_eq!(empty.message, "Book ID is required");

    client.add_book(book("b1", "Dune")).await.unwrap();
    let duplicate = client.add_book(book("b1", "Other")).await.unwrap().into_inner();
    assert_eq!(duplicate.message, "Book already exists");

    let updated = client
        .update_book(book("b1", "Dune Messiah"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(updated.message, "Book updated successfully");
    assert_eq!(server.catalog.get("b1").unwrap().title, "Dune Messiah");

    let missing = client
        .update_book(book("nope", "X"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(missing.message, "Book not found");

    let deleted = client
        .delete_book(BookRequest {
            id: "b1".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(deleted.message, "Book deleted successfully");

    let gone = client
        .delete_book(BookRequest {
            id: "b1".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(gone.message, "Book not found");

    server.shutdown().await;
}

#[tokio::test]
async fn test_store_failure_is_internal() {
    let server = TestServer::spawn().await;
    let token = register(&server, &SampleUser::unique()).await;
    let mut client = server
        .library_client(BearerInterceptor::with_token(token))
        .await;

    server.catalog.set_unavailable(true);

    let status = client.add_book(book("b1", "Dune")).await.unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("Failed to add book"));

    let status = client
        .list_books(ListBookRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Internal);

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_books_pages_over_the_wire() {
    let server = TestServer::spawn().await;
    let token = register(&server, &SampleUser::unique()).await;
    let mut client = server
        .library_client(BearerInterceptor::with_token(token))
        .await;

    for sample in sample_books(12) {
        client
            .add_book(Book {
                id: sample.id,
                title: sample.title,
                author: sample.author,
            })
            .await
            .unwrap();
    }

    let last = client
        .list_books(ListBookRequest {
            page: 3,
            page_size: 5,
        })
        .await
        .unwrap()
        .into_inner();
    let ids: Vec<_> = last.books.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, ["book11", "book12"]);
    assert_eq!(last.total_count, 12);

    let defaulted = client
        .list_books(ListBookRequest {
            page: 0,
            page_size: 0,
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(defaulted.books.len(), 10);
    assert_eq!(defaulted.books[0].id, "book01");

    server.shutdown().await;
}

#[tokio::test]
async fn test_batch_add_over_the_wire() {
    let server = TestServer::spawn().await;
    let token = register(&server, &SampleUser::unique()).await;
    let mut client = server
        .library_client(BearerInterceptor::with_token(token))
        .await;

    client.add_book(book("b3", "Existing")).await.unwrap();

    let items = vec![
        book("b1", "One"),
        book("", "No id"),
        book("b3", "Duplicate"),
        book("b2", "Two"),
    ];
    let response = client
        .batch_add_books(futures::stream::iter(items))
        .await
        .unwrap()
        .into_inner();

    let outcomes: Vec<_> = response
        .responses
        .iter()
        .map(|r| (r.id.as_str(), r.message.as_str()))
        .collect();
    assert_eq!(
        outcomes,
        [
            ("b1", "Book added successfully"),
            ("", "Book ID is required"),
            ("b3", "Book already exists"),
            ("b2", "Book added successfully"),
        ]
    );
    assert_eq!(server.catalog.get("b3").unwrap().title, "Existing");

    server.shutdown().await;
}

#[tokio::test]
async fn test_batch_stream_requires_credentials() {
    let server = TestServer::spawn().await;
    let mut client = server.library_client(BearerInterceptor::new()).await;

    let status = client
        .batch_add_books(futures::stream::iter(vec![book("b1", "One")]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(server.catalog.get("b1").is_none());

    server.shutdown().await;
}

/// Wait until the server has stored `id`.
async fn wait_for_book(server: &TestServer, id: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.catalog.get(id).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_open_stream_outlives_subject_deletion() {
    let server = TestServer::spawn().await;
    let user = SampleUser::unique();
    let token = register(&server, &user).await;

    let mut streaming = server
        .library_client(BearerInterceptor::with_token(token.clone()))
        .await;
    let (tx, rx) = mpsc::channel(4);
    tx.send(book("s1", "First")).await.unwrap();
    let call =
        tokio::spawn(async move { streaming.batch_add_books(ReceiverStream::new(rx)).await });

    // The first item landing proves the stream was authorized and is being read.
    wait_for_book(&server, "s1").await;
    server.identities.remove(&user.username);

    tx.send(book("s2", "Second")).await.unwrap();
    tx.send(book("s3", "Third")).await.unwrap();
    drop(tx);

    let response = call.await.unwrap().unwrap().into_inner();
    let outcomes: Vec<_> = response
        .responses
        .iter()
        .map(|r| (r.id.as_str(), r.message.as_str()))
        .collect();
    assert_eq!(
        outcomes,
        [
            ("s1", "Book added successfully"),
            ("s2", "Book added successfully"),
            ("s3", "Book added successfully"),
        ]
    );

    // New calls with the same token are revalidated and rejected.
    let mut unary = server
        .library_client(BearerInterceptor::with_token(token))
        .await;
    let status = unary.add_book(book("s4", "Fourth")).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(server.catalog.get("s4").is_none());

    server.shutdown().await;
}
