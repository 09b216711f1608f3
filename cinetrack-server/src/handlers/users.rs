//! Login, password changes, and the admin-only account management surface.
//! There is no self-registration; accounts are created by an admin.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use cinetrack_core::models::User;
use cinetrack_core::CoreError;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::errors::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let user = state.users.by_username(&payload.username).await?;
    let Some(user) = user else {
        warn!(username = %payload.username, "login attempt for unknown user");
        return Err(AppError::unauthorized("invalid username or password"));
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(username = %user.username, "login attempt with wrong password");
        return Err(AppError::unauthorized("invalid username or password"));
    }

    let token = generate_token(&user, &state.config.jwt_secret)
        .map_err(|err| AppError::internal(format!("token generation failed: {err}")))?;
    info!(username = %user.username, "user logged in");

    Ok(Json(json!({
        "message": "login successful",
        "user": user,
        "token": token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(AppError::bad_request("current password is incorrect"));
    }
    if payload.new_password.len() < 6 {
        return Err(AppError::bad_request(
            "new password must be at least 6 characters",
        ));
    }

    let hash = hash_password(&payload.new_password)?;
    state.users.update_password(user.id, &hash).await?;
    info!(username = %user.username, "password changed");

    Ok(Json(json!({ "message": "password changed" })))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    if payload.username.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(AppError::bad_request("username and email are required"));
    }
    if payload.password.len() < 6 {
        return Err(AppError::bad_request(
            "password must be at least 6 characters",
        ));
    }

    let hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(&payload.username, &payload.email, &hash, payload.is_admin)
        .await
        .map_err(|err| match err {
            CoreError::Conflict(_) => AppError::bad_request("username or email already exists"),
            other => other.into(),
        })?;
    info!(username = %user.username, is_admin = user.is_admin, "user created");

    Ok(Json(json!({ "message": "user created", "user": user })))
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Value>> {
    if admin.id == user_id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    state.users.delete(user_id).await?;
    info!(admin = %admin.username, user_id, "user deleted");
    Ok(Json(json!({ "message": "user deleted" })))
}
