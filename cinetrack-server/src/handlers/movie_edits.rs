//! User overrides for display metadata (custom backdrop timestamp, genre
//! label, notes), keyed per user and title.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use cinetrack_core::models::{MovieEdit, NewMovieEdit, User};

use crate::errors::AppResult;
use crate::AppState;

pub async fn upsert(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewMovieEdit>,
) -> AppResult<Json<Value>> {
    let edit = state.movie_edits.upsert(user.id, &payload).await?;
    Ok(Json(json!({ "message": "edit saved", "edit": edit })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<MovieEdit>>> {
    let edits = state.movie_edits.list(user.id).await?;
    Ok(Json(edits))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Option<MovieEdit>>> {
    let edit = state.movie_edits.get(user.id, movie_id).await?;
    Ok(Json(edit))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.movie_edits.delete(user.id, movie_id).await?;
    Ok(Json(json!({ "message": "edit deleted" })))
}
