//! Server assembly.
//!
//! Wires stores, hashing and token settings into the two gRPC services and
//! wraps every route in the tracing and authorization layers. The binary and
//! the end-to-end tests both build their server here.

use std::sync::Arc;
use std::time::Duration;

use tonic::transport::Server;
use tonic::transport::server::Router;
use tower::layer::util::{Identity, Stack};

use crate::auth::{AuthLayer, Authenticator, PolicyTable};
use crate::catalog::{CatalogService, CatalogStore};
use crate::grpc::{LibraryServiceImpl, UserServiceImpl};
use crate::identity::{CredentialIssuer, IdentityStore};
use crate::jwt::{TokenIssuer, TokenValidator};
use crate::middleware::TracingLayer;
use crate::password::SecretHasher;
use crate::proto::library_service_server::LibraryServiceServer;
use crate::proto::user_service_server::UserServiceServer;

/// Name used in spans and logs.
pub const SERVICE_NAME: &str = "library-service";

/// Router with tracing outermost and authorization next to the routes.
pub type LibraryRouter = Router<Stack<AuthLayer, Stack<TracingLayer, Identity>>>;

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HS256 secret
    pub secret: Vec<u8>,
    /// Issuer claim
    pub issuer: String,
    /// Token lifetime
    pub ttl: Duration,
}

/// Collaborators the services run on.
#[derive(Clone)]
pub struct Dependencies {
    /// User records
    pub identities: Arc<dyn IdentityStore>,
    /// Book records
    pub catalog: Arc<dyn CatalogStore>,
    /// Password hashing
    pub hasher: Arc<dyn SecretHasher>,
    /// Token signing settings
    pub tokens: TokenSettings,
}

/// Build the routed, layered server.
#[must_use]
pub fn router(deps: Dependencies) -> LibraryRouter {
    let Dependencies {
        identities,
        catalog,
        hasher,
        tokens,
    } = deps;

    let issuer = TokenIssuer::new(&tokens.secret, tokens.issuer.clone(), tokens.ttl);
    let validator = TokenValidator::new(&tokens.secret, tokens.issuer);

    let user_service = UserServiceImpl::new(CredentialIssuer::new(
        Arc::clone(&identities),
        hasher,
        issuer,
    ));
    let library_service = LibraryServiceImpl::new(CatalogService::new(catalog));
    let auth = AuthLayer::new(Authenticator::new(
        validator,
        identities,
        PolicyTable::library_default(),
    ));

    let mut server = Server::builder()
        .layer(TracingLayer::new(SERVICE_NAME))
        .layer(auth);

    server
        .add_service(UserServiceServer::new(user_service))
        .add_service(LibraryServiceServer::new(library_service))
}
