//! Shared harness for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use argon2::Params;
use library_service::auth::BearerInterceptor;
use library_service::catalog::MemoryCatalogStore;
use library_service::identity::MemoryIdentityStore;
use library_service::password::Argon2Hasher;
use library_service::proto::library_service_client::LibraryServiceClient;
use library_service::proto::user_service_client::UserServiceClient;
use library_service::shutdown::ShutdownCoordinator;
use library_service::{Dependencies, TokenSettings, router};
use test_utils::{TEST_ISSUER, TEST_JWT_SECRET};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;

/// Cheapest Argon2 cost the crate accepts.
pub fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(Params::new(8, 1, 1, None).unwrap())
}

/// Dependencies over fresh in-memory stores.
pub fn memory_dependencies(
    identities: &Arc<MemoryIdentityStore>,
    catalog: &Arc<MemoryCatalogStore>,
) -> Dependencies {
    Dependencies {
        identities: Arc::clone(identities) as _,
        catalog: Arc::clone(catalog) as _,
        hasher: Arc::new(cheap_hasher()),
        tokens: TokenSettings {
            secret: TEST_JWT_SECRET.to_vec(),
            issuer: TEST_ISSUER.to_string(),
            ttl: Duration::from_secs(3600),
        },
    }
}

/// A server running on a loopback port until dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub identities: Arc<MemoryIdentityStore>,
    pub catalog: Arc<MemoryCatalogStore>,
    coordinator: ShutdownCoordinator,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let identities = Arc::new(MemoryIdentityStore::new());
        let catalog = Arc::new(MemoryCatalogStore::new());
        let coordinator = ShutdownCoordinator::new();

        let server = router(memory_dependencies(&identities, &catalog))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                coordinator.subscribe().recv(),
            );
        let handle = tokio::spawn(server);

        Self {
            addr,
            identities,
            catalog,
            coordinator,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn channel(&self) -> Channel {
        Channel::from_shared(self.url())
            .unwrap()
            .connect()
            .await
            .unwrap()
    }

    pub async fn user_client(&self) -> UserServiceClient<Channel> {
        UserServiceClient::new(self.channel().await)
    }

    pub async fn library_client(
        &self,
        credentials: BearerInterceptor,
    ) -> LibraryServiceClient<InterceptedService<Channel, BearerInterceptor>> {
        LibraryServiceClient::with_interceptor(self.channel().await, credentials)
    }

    /// Stop accepting calls. Clients still in scope may keep their
    /// connections open, so draining is bounded.
    pub async fn shutdown(self) {
        self.coordinator.trigger();
        if let Ok(joined) = tokio::time::timeout(Duration::from_secs(5), self.handle).await {
            joined.unwrap().unwrap();
        }
    }
}
