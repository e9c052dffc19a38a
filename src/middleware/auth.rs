use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::auth::token::TokenError;
use crate::error::ApiError;
use crate::router::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("malformed authorization header")]
    MalformedCredential,
    #[error("token verification failed")]
    InvalidToken(#[source] TokenError),
}

/// Principal extraction middleware for protected routes.
///
/// Parses the authorization header, verifies the token and attaches the
/// resulting [`Principal`](crate::auth::Principal) to the request. Rejected
/// requests turn around here without ever touching the data tier.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let principal = state
        .tokens
        .verify(token)
        .map_err(AuthError::InvalidToken)?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the authorization header.
///
/// The header must be exactly `Bearer <token>`: two space-separated parts,
/// case-sensitive scheme, non-empty token. Anything else is rejected before
/// any signature check happens.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let value = value.to_str().map_err(|_| AuthError::MalformedCredential)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_is_a_missing_credential() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn well_formed_header_yields_the_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_sensitive() {
        let headers = headers_with("bearer abc");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        let headers = headers_with("Basic abc");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn single_part_is_malformed() {
        let headers = headers_with("Bearer");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn more_than_two_parts_is_malformed() {
        let headers = headers_with("Bearer abc def");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn empty_token_is_malformed() {
        let headers = headers_with("Bearer ");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MalformedCredential)
        ));
    }
}
