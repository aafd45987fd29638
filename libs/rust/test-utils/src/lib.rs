//! Shared test utilities for the library platform.
//!
//! This crate provides:
//! - Proptest generators for usernames, passwords and books
//! - Test fixtures with sample data and shared test constants

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
