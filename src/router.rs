use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::TenantDb;
use crate::handlers;
use crate::middleware::require_principal;

/// Shared application state: the immutable configuration products handed to
/// every request. Identity lookups (login, register) use `pool` directly;
/// row-owned resources are only reachable through `db`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub db: TenantDb,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: PgPool) -> Self {
        Self {
            db: TenantDb::new(pool.clone()),
            tokens: TokenService::from_config(&config.security),
            hasher: PasswordHasher::new(config.security.bcrypt_cost),
            pool,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/whoami", get(handlers::auth::whoami))
        .route(
            "/api/reminders",
            get(handlers::reminders::list).post(handlers::reminders::create),
        )
        .route("/api/reminders/:id", delete(handlers::reminders::remove))
        .route_layer(from_fn_with_state(state.clone(), require_principal));

    Router::new()
        // Public
        .route("/health", get(health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("health check database error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
