use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::token::Principal;
use crate::error::ApiError;
use crate::models::reminder::Reminder;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReminder {
    pub title: String,
    pub body: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

/// GET /api/reminders - reminders owned by the caller
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let reminders = state
        .db
        .with_principal(&principal, |conn| {
            async move {
                // No owner predicate: the row policies scope the result set.
                let rows = sqlx::query_as::<_, Reminder>(
                    "SELECT id, owner_id, title, body, due_at, done, created_at
                     FROM reminders
                     ORDER BY due_at NULLS LAST, created_at",
                )
                .fetch_all(&mut **conn)
                .await?;
                Ok(rows)
            }
            .boxed()
        })
        .await?;

    Ok(Json(reminders))
}

/// POST /api/reminders - create a reminder owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateReminder>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let owner_id = principal.id;
    let reminder = state
        .db
        .with_principal(&principal, move |conn| {
            async move {
                let row = sqlx::query_as::<_, Reminder>(
                    "INSERT INTO reminders (owner_id, title, body, due_at)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id, owner_id, title, body, due_at, done, created_at",
                )
                .bind(owner_id)
                .bind(&payload.title)
                .bind(&payload.body)
                .bind(payload.due_at)
                .fetch_one(&mut **conn)
                .await?;
                Ok(row)
            }
            .boxed()
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// DELETE /api/reminders/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .db
        .with_principal(&principal, move |conn| {
            async move {
                let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
                    .bind(id)
                    .execute(&mut **conn)
                    .await?;
                Ok(result.rows_affected())
            }
            .boxed()
        })
        .await?;

    if deleted == 0 {
        // A reminder owned by someone else looks exactly like a missing one.
        return Err(ApiError::not_found("reminder not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
