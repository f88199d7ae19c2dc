use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{extractors::AuthUser, jwt::JwtKeys};
use crate::error::AppError;

/// Guards protected routes: verifies the bearer token once and stores the
/// subject as [`AuthUser`] in the request extensions.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejected token");
        AppError::InvalidToken
    })?;

    request.extensions_mut().insert(AuthUser(claims.sub));
    Ok(next.run(request).await)
}

/// Reads the Authorization header; the `Bearer ` prefix is optional.
/// An absent or empty header is a missing token, an unreadable one is invalid.
fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingToken)?;
    let raw = value.to_str().map_err(|_| {
        warn!("authorization header is not valid text");
        AppError::InvalidToken
    })?;
    Ok(raw.strip_prefix("Bearer ").unwrap_or(raw))
}
