//! gRPC adapters.
//!
//! Thin translation between generated protobuf types and the domain
//! services. Authorization has already happened in the tower layer by the
//! time a handler runs.

mod library_service;
mod user_service;

pub use library_service::LibraryServiceImpl;
pub use user_service::UserServiceImpl;

use tonic::Request;
use uuid::Uuid;

use crate::middleware::CorrelationId;

/// Correlation id the tracing layer attached to this call.
fn correlation_id<T>(request: &Request<T>) -> Uuid {
    request
        .extensions()
        .get::<CorrelationId>()
        .copied()
        .unwrap_or_default()
        .0
}
