//! Favorite titles, a flat per-user list independent of watch status.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use cinetrack_core::models::{Favorite, NewFavorite, User};

use crate::errors::AppResult;
use crate::AppState;

pub async fn upsert(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewFavorite>,
) -> AppResult<Json<Value>> {
    let favorite = state.favorites.upsert(user.id, &payload).await?;
    Ok(Json(json!({ "message": "favorite saved", "id": favorite.id })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Favorite>>> {
    let favorites = state.favorites.list(user.id).await?;
    Ok(Json(favorites))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Option<Favorite>>> {
    let favorite = state.favorites.get(user.id, movie_id).await?;
    Ok(Json(favorite))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.favorites.delete(user.id, movie_id).await?;
    Ok(Json(json!({ "message": "favorite removed" })))
}
