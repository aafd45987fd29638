//! Library Service - book catalog behind revalidating bearer authentication.
//!
//! Users register and log in through `library.UserService` to obtain an
//! HS256 bearer token. Every other call goes through an authorization layer
//! that validates the token and confirms its subject still exists before
//! `library.LibraryService` handles it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod server;
pub mod shutdown;

/// Generated protobuf types and gRPC stubs for package `library`.
#[allow(missing_docs, clippy::pedantic, clippy::nursery)]
pub mod proto {
    tonic::include_proto!("library");
}

pub use config::Config;
pub use error::{ErrorCode, ErrorResponse, LibraryError};
pub use server::{Dependencies, TokenSettings, router};
