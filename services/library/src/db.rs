//! Connection pool and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LibraryError;

/// Embedded migrations from `migrations/`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open the pool; acquiring a connection is bounded by the store timeout.
///
/// # Errors
///
/// `LibraryError::Store` when the database cannot be reached.
pub async fn connect(config: &Config) -> Result<PgPool, LibraryError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.store_timeout)
        .connect(config.database_url.as_str())
        .await?;

    info!(
        host = config.database_url.host_str().unwrap_or_default(),
        max_connections = config.db_max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Drop every table, including the migration ledger, so migrations rebuild
/// the schema from scratch.
///
/// # Errors
///
/// `LibraryError::Store` when a statement fails.
pub async fn reset(pool: &PgPool) -> Result<(), LibraryError> {
    warn!("Clearing database before startup");
    for statement in [
        "DROP TABLE IF EXISTS books",
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS _sqlx_migrations",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Apply pending migrations.
///
/// # Errors
///
/// `LibraryError::Internal` when a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), LibraryError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| LibraryError::Internal(anyhow::Error::new(e).context("migration failed")))?;
    info!("Database migrations applied");
    Ok(())
}

/// Connect, optionally reset, then migrate.
///
/// # Errors
///
/// Any failure of the three steps.
pub async fn bootstrap(config: &Config) -> Result<PgPool, LibraryError> {
    let pool = connect(config).await?;
    if config.clear_db_on_startup {
        reset(&pool).await?;
    }
    migrate(&pool).await?;
    Ok(pool)
}
