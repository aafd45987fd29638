//! Tower middleware shared by every gRPC route.

pub mod tracing;

pub use self::tracing::{CorrelationId, TracingLayer, TracingService};
