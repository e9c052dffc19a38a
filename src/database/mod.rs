pub mod tenant;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

pub use tenant::{TenantConn, TenantDb, TenantDbError, TENANT_SCOPE_KEY};

/// Build the shared connection pool from configuration.
///
/// The pool hands out a bounded number of connections; a request that cannot
/// get one within the acquire timeout fails instead of queuing unboundedly.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}
