use std::ops::{Deref, DerefMut};

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::auth::token::Principal;

/// Connection-local configuration key the row-ownership policies read.
///
/// This is a constant rather than configuration: the policies in the schema
/// name it literally, and the two must not drift apart.
pub const TENANT_SCOPE_KEY: &str = "app.current_user_id";

#[derive(Debug, Error)]
pub enum TenantDbError {
    #[error("no database connection became available in time")]
    PoolExhausted,
    #[error("failed to bind tenant context")]
    BindFailure(#[source] sqlx::Error),
    #[error("constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },
    #[error("storage error")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for TenantDbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => TenantDbError::PoolExhausted,
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                TenantDbError::ConstraintViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                }
            }
            other => TenantDbError::Storage(other),
        }
    }
}

/// A connection with the caller's identity bound for row-ownership policies.
///
/// Only obtainable inside [`TenantDb::with_principal`], so a tenant-scoped
/// query cannot be issued without the bind step having run first. Derefs to
/// [`PgConnection`] for query execution (`&mut **conn`).
pub struct TenantConn {
    tx: Transaction<'static, Postgres>,
}

impl Deref for TenantConn {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl DerefMut for TenantConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}

/// Tenant-context-bound access to the shared connection pool.
///
/// Row-ownership enforcement lives in the database; this layer's job is to
/// make sure every query a handler issues runs on a connection carrying the
/// right principal, and that no connection re-enters the pool with a stale
/// binding.
#[derive(Clone)]
pub struct TenantDb {
    pool: PgPool,
}

impl TenantDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run one unit of work with `principal` bound to a pooled connection.
    ///
    /// Checkout opens a transaction (blocking up to the pool's acquire
    /// timeout, then failing with [`TenantDbError::PoolExhausted`]). The
    /// session-binding statement is the first statement of the unit of work
    /// and runs on that same connection; the binding is transaction-local,
    /// so commit, rollback and drop all clear it before the connection is
    /// reused. Errors from `work` propagate after the rollback; a failed
    /// bind aborts the request rather than proceeding unscoped.
    pub async fn with_principal<T, F>(
        &self,
        principal: &Principal,
        work: F,
    ) -> Result<T, TenantDbError>
    where
        F: for<'c> FnOnce(&'c mut TenantConn) -> BoxFuture<'c, Result<T, TenantDbError>>,
    {
        let tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(sqlx::Error::PoolTimedOut) => return Err(TenantDbError::PoolExhausted),
            Err(err) => return Err(TenantDbError::Storage(err)),
        };

        let mut conn = TenantConn { tx };

        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(TENANT_SCOPE_KEY)
            .bind(principal.id.to_string())
            .execute(&mut *conn.tx)
            .await
            .map_err(TenantDbError::BindFailure)?;

        match work(&mut conn).await {
            Ok(value) => {
                conn.tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = conn.tx.rollback().await {
                    tracing::warn!("rollback failed after unit of work error: {}", rollback);
                }
                Err(err)
            }
        }
    }
}
