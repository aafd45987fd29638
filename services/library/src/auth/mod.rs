//! Call authorization.
//!
//! Every inbound call passes through [`AuthLayer`]. The layer consults the
//! [`PolicyTable`]; protected methods need a valid bearer token whose subject
//! still exists in the identity store. On success a [`CallIdentity`] is
//! attached to the call for the handler.

pub mod authenticator;
pub mod client;
pub mod identity;
pub mod layer;
pub mod policy;

pub use authenticator::{Authenticator, Decision};
pub use client::BearerInterceptor;
pub use identity::CallIdentity;
pub use layer::{AuthLayer, AuthService};
pub use policy::{MethodPolicy, PolicyTable};
