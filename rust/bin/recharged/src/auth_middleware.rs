//! Bearer token middleware.
//!
//! Extracts the JWT from `Authorization: Bearer <token>`, verifies it with
//! the account service and stores the token subject as a [`Caller`] in
//! request extensions. Handlers acting on a user's behalf check it.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use account::api::PUBLIC_PREFIXES;
use account::service::AccountService;
use recharge_core::{Caller, ServiceError};

/// Authentication failures, rendered as `UNAUTHENTICATED` errors.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let msg = match self {
            AuthError::MissingToken => "missing authorization token".to_string(),
            AuthError::InvalidToken(e) => e,
        };
        ServiceError::Unauthorized(msg).into_response()
    }
}

pub async fn auth_middleware(
    State(accounts): State<Arc<AccountService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = accounts
        .verify_token(token)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    request
        .extensions_mut()
        .insert(Caller::new(claims.sub, claims.role));
    Ok(next.run(request).await)
}

/// Check if a request path is public (no auth required).
fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version")
        || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}
