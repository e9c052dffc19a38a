//! Router-level tests for principal extraction. No database required: the
//! pool is built lazily and the routes exercised here never touch it.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use hearth_api::auth::TokenService;
use hearth_api::config::{AppConfig, DatabaseConfig, SecurityConfig, ServerConfig};
use hearth_api::router::{router, AppState};

const TEST_SECRET: &str = "test-secret";

fn test_state() -> AppState {
    let config = AppConfig {
        server: ServerConfig { port: 0 },
        database: DatabaseConfig {
            url: "postgres://127.0.0.1/hearth_unused".into(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        security: SecurityConfig {
            jwt_secret: TEST_SECRET.into(),
            token_ttl_hours: 1,
            bcrypt_cost: 4,
        },
    };

    let pool = PgPool::connect_lazy(&config.database.url).expect("lazy pool");
    AppState::new(&config, pool)
}

async fn get_whoami(auth_header: Option<&str>) -> Result<(StatusCode, Value)> {
    let app = router(test_state());

    let mut request = Request::builder().uri("/api/whoami");
    if let Some(value) = auth_header {
        request = request.header(header::AUTHORIZATION, value);
    }

    let response = app.oneshot(request.body(Body::empty())?).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&bytes)?;

    Ok((status, body))
}

#[tokio::test]
async fn missing_header_is_rejected() -> Result<()> {
    let (status, body) = get_whoami(None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_headers_are_rejected() -> Result<()> {
    for value in ["Basic abc", "bearer abc", "Bearer", "Bearer ", "Bearer a b"] {
        let (status, body) = get_whoami(Some(value)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {value:?}");
        assert!(body["error"].is_string(), "header: {value:?}");
    }
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let tokens = TokenService::new(TEST_SECRET, Duration::hours(1));
    let token = tokens.issue_with_ttl(Uuid::new_v4(), "a@x.com", Duration::hours(-1))?;

    let (status, _) = get_whoami(Some(&format!("Bearer {token}"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

/// The response must not reveal why a token failed verification: an expired
/// token and one signed with the wrong secret produce identical responses.
#[tokio::test]
async fn token_failure_reasons_are_indistinguishable() -> Result<()> {
    let tokens = TokenService::new(TEST_SECRET, Duration::hours(1));
    let expired = tokens.issue_with_ttl(Uuid::new_v4(), "a@x.com", Duration::hours(-1))?;

    let wrong_secret = TokenService::new("some-other-secret", Duration::hours(1));
    let forged = wrong_secret.issue(Uuid::new_v4(), "a@x.com")?;

    let (expired_status, expired_body) = get_whoami(Some(&format!("Bearer {expired}"))).await?;
    let (forged_status, forged_body) = get_whoami(Some(&format!("Bearer {forged}"))).await?;

    assert_eq!(expired_status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired_status, forged_status);
    assert_eq!(expired_body, forged_body);
    Ok(())
}

#[tokio::test]
async fn fresh_token_reaches_the_handler() -> Result<()> {
    let user_id = Uuid::new_v4();
    let tokens = TokenService::new(TEST_SECRET, Duration::hours(1));
    let token = tokens.issue(user_id, "a@x.com")?;

    let (status, body) = get_whoami(Some(&format!("Bearer {token}"))).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], Value::String(user_id.to_string()));
    assert_eq!(body["email"], Value::String("a@x.com".into()));
    Ok(())
}
