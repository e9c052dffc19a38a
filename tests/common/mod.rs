//! Shared setup for integration tests: connects to the test database,
//! applies the schema and mints verified principals through the real
//! issue/verify path.

use chrono::Duration;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use hearth_api::auth::{Principal, TokenService};
use hearth_api::config::DatabaseConfig;
use hearth_api::database::{self, TenantDb};

pub const TEST_SECRET: &str = "integration-secret";

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

pub struct TestContext {
    pub pool: PgPool,
    pub db: TenantDb,
    pub tokens: TokenService,
}

impl TestContext {
    pub async fn new(max_connections: u32) -> Self {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a test database for integration tests");

        let config = DatabaseConfig {
            url,
            max_connections,
            acquire_timeout_secs: 1,
        };

        let pool = database::connect(&config).await.expect("connect");
        apply_schema(&pool).await;

        Self {
            db: TenantDb::new(pool.clone()),
            tokens: TokenService::new(TEST_SECRET, Duration::hours(1)),
            pool,
        }
    }

    /// Insert a user and hand back their verified principal.
    pub async fn create_principal(&self, tag: &str) -> Principal {
        let email = format!("{}-{}@test.com", tag, Uuid::new_v4());

        let row: (Uuid,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, display_name)
             VALUES ($1, 'x', $2)
             RETURNING id",
        )
        .bind(&email)
        .bind(tag)
        .fetch_one(&self.pool)
        .await
        .expect("insert user");

        let token = self.tokens.issue(row.0, &email).expect("issue");
        self.tokens.verify(&token).expect("verify")
    }

    pub fn unique_tag(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

/// Apply the schema on one connection, serialized across parallel tests
/// with an advisory lock.
async fn apply_schema(pool: &PgPool) {
    let mut conn = pool.acquire().await.expect("acquire for schema");

    (&mut *conn)
        .execute("SELECT pg_advisory_lock(715001)")
        .await
        .expect("advisory lock");

    let applied = (&mut *conn).execute(SCHEMA).await;

    (&mut *conn)
        .execute("SELECT pg_advisory_unlock(715001)")
        .await
        .expect("advisory unlock");

    applied.expect("apply schema");
}
