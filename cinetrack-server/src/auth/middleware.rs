use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use cinetrack_core::models::User;

use super::jwt::validate_token;
use crate::errors::AppError;
use crate::AppState;

/// Requires a valid bearer token for a known user; inserts the `User` into
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)?;
    let user = validate_and_get_user(&state, &token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Like `auth_middleware` but a missing or invalid token just leaves the
/// request without an identity.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_bearer_token(&request) {
        if let Ok(user) = validate_and_get_user(&state, &token).await {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}

/// Must run after `auth_middleware`.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    if !user.is_admin {
        return Err(AppError::forbidden("admin access required"));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<String, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("invalid authorization header"))?;

    Ok(token.to_string())
}

async fn validate_and_get_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = validate_token(token, &state.config.jwt_secret)
        .map_err(|_| AppError::unauthorized("invalid or expired token"))?;

    state
        .users
        .by_id(claims.sub)
        .await
        .map_err(|_| AppError::unauthorized("unknown user"))
}
