//! Shared library for cross-cutting concerns in library-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - Store error types with retryability classification
//! - Tracing subscriber initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod tracing_config;

pub use error::{StoreError, with_timeout};
pub use tracing_config::{TracingConfig, init_tracing};
