//! Library Service - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use library_service::catalog::PgCatalogStore;
use library_service::identity::PgIdentityStore;
use library_service::password::Argon2Hasher;
use library_service::server::SERVICE_NAME;
use library_service::shutdown::{ShutdownCoordinator, run_with_graceful_shutdown};
use library_service::{Config, Dependencies, TokenSettings, db, router};
use rust_common::{TracingConfig, init_tracing};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(
        &TracingConfig::default()
            .with_service_name(SERVICE_NAME)
            .with_log_level(&config.log_level)
            .with_json_output(config.log_json),
    );

    info!("Starting Library Service");

    if config.jwt_secret_is_default {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid HOST/PORT")?;

    let pool = db::bootstrap(&config).await.context("database bootstrap failed")?;

    let deps = Dependencies {
        identities: Arc::new(PgIdentityStore::new(pool.clone(), config.store_timeout)),
        catalog: Arc::new(PgCatalogStore::new(pool.clone(), config.store_timeout)),
        hasher: Arc::new(Argon2Hasher::new()),
        tokens: TokenSettings {
            secret: config.jwt_secret.clone().into_bytes(),
            issuer: config.jwt_issuer.clone(),
            ttl: config.token_ttl,
        },
    };

    let coordinator = ShutdownCoordinator::new();
    let server = router(deps).serve_with_shutdown(addr, coordinator.subscribe().recv());

    info!(%addr, "Library Service listening");

    run_with_graceful_shutdown(server, coordinator, config.shutdown_timeout)
        .await
        .context("server error")?;

    pool.close().await;
    info!("Library Service stopped");

    Ok(())
}
