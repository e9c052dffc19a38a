use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::token::Principal;
use crate::database::tenant::TenantDbError;
use crate::error::ApiError;
use crate::models::user::{UserRecord, UserResponse};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create an account and receive a token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let password_hash = state.hasher.hash(&payload.password).await?;
    let display_name = payload
        .display_name
        .unwrap_or_else(|| payload.email.clone());

    let user = sqlx::query_as::<_, UserRecord>(
        "INSERT INTO users (email, password_hash, display_name)
         VALUES ($1, $2, $3)
         RETURNING id, email, password_hash, display_name, created_at",
    )
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&display_name)
    .fetch_one(&state.pool)
    .await
    .map_err(TenantDbError::from)
    .map_err(|err| match err {
        TenantDbError::ConstraintViolation { .. } => {
            ApiError::conflict("email is already registered")
        }
        other => other.into(),
    })?;

    let token = state.tokens.issue(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": UserResponse::from(user) })),
    ))
}

/// POST /auth/login - authenticate and receive a token
///
/// Unknown email and wrong password produce the same response.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT id, email, password_hash, display_name, created_at
         FROM users
         WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await
    .map_err(TenantDbError::from)?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized("invalid email or password"));
    };

    let verified = state
        .hasher
        .verify(&payload.password, &user.password_hash)
        .await?;
    if !verified {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    let token = state.tokens.issue(user.id, &user.email)?;

    Ok(Json(
        json!({ "token": token, "user": UserResponse::from(user) }),
    ))
}

/// GET /api/whoami - echo the verified identity
pub async fn whoami(Extension(principal): Extension<Principal>) -> Json<Value> {
    Json(json!({
        "id": principal.id,
        "email": principal.email,
        "issued_at": principal.issued_at,
        "expires_at": principal.expires_at,
    }))
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ApiError::bad_request("invalid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    // bcrypt truncates past 72 bytes
    if password.len() > 72 {
        return Err(ApiError::bad_request(
            "password must be at most 72 characters",
        ));
    }
    Ok(())
}
