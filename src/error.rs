// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::database::tenant::TenantDbError;
use crate::middleware::auth::AuthError;

/// HTTP API error with an appropriate status code and a client-safe message.
///
/// Internal detail (driver errors, token failure reasons) is logged here and
/// never reaches the response body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => ApiError::unauthorized("authentication required"),
            AuthError::MalformedCredential => {
                ApiError::unauthorized("invalid authorization header")
            }
            // All verification failures collapse into one message so the
            // response never reveals why a token was rejected.
            AuthError::InvalidToken(_) => ApiError::unauthorized("invalid or expired token"),
        }
    }
}

impl From<TenantDbError> for ApiError {
    fn from(err: TenantDbError) -> Self {
        match err {
            TenantDbError::PoolExhausted => {
                tracing::warn!("connection pool exhausted");
                ApiError::service_unavailable("server is busy, please try again")
            }
            TenantDbError::BindFailure(e) => {
                tracing::error!("failed to bind tenant context: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            TenantDbError::ConstraintViolation { constraint } => {
                tracing::debug!("constraint violation: {}", constraint);
                ApiError::conflict("a conflicting record already exists")
            }
            TenantDbError::Storage(e) => {
                // Log the real error but return a generic message
                tracing::error!("storage error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Issuance(e) => {
                tracing::error!("token issuance failed: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            _ => ApiError::unauthorized("invalid or expired token"),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("password hashing failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message() });
        (self.status_code(), Json(body)).into_response()
    }
}
