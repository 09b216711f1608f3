//! Per-user watch status: mark/unmark, listing, metadata repair, and the
//! batch backfill endpoints that patch rows whose enrichment fields were
//! never stored or still hold placeholder text.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use cinetrack_core::credits::{Credits, MediaKind};
use cinetrack_core::db::{MetadataPatch, MissingField};
use cinetrack_core::locale::{countries_display, genres_display, NO_GENRES, NO_OVERVIEW};
use cinetrack_core::models::{NewWatchStatus, User, WatchState, WatchStatusRecord};
use cinetrack_core::reconcile::{apply_refresh, fetch_title_snapshot};
use cinetrack_core::tmdb::Details;

use crate::errors::{AppError, AppResult};
use crate::AppState;

/// Pause between upstream calls in batch loops, keeping well under the
/// upstream rate limit.
const BATCH_DELAY: Duration = Duration::from_millis(250);

pub async fn upsert(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(mut payload): Json<NewWatchStatus>,
) -> AppResult<Json<Value>> {
    let Some(status) = WatchState::parse(&payload.status) else {
        return Err(AppError::bad_request(
            "status must be 'watched' or 'want_to_watch'",
        ));
    };

    if let Some(rating) = payload.rating {
        if !(1..=10).contains(&rating) {
            return Err(AppError::bad_request("rating must be between 1 and 10"));
        }
    }

    // A watched mark always stamps the current time, even when the client
    // supplied a date of its own.
    if status == WatchState::Watched {
        payload.watched_date = Some(Utc::now());
    }

    let record = state.watch_status.upsert(user.id, &payload).await?;
    info!(user = %user.username, movie_id = record.movie_id, status = %record.status, "watch status saved");

    Ok(Json(json!({
        "message": "watch status saved",
        "id": record.id,
        "status": record.status,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    #[serde(default = "default_list_page")]
    pub page: u32,
    #[serde(default = "default_list_limit")]
    pub limit: u32,
}

fn default_list_page() -> u32 {
    1
}

fn default_list_limit() -> u32 {
    20
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<WatchStatusRecord>>> {
    if params.page < 1 {
        return Err(AppError::bad_request("page must be at least 1"));
    }
    if !(1..=1000).contains(&params.limit) {
        return Err(AppError::bad_request("limit must be between 1 and 1000"));
    }

    let status = match params.status.as_deref() {
        Some(raw) => Some(
            WatchState::parse(raw)
                .ok_or_else(|| AppError::bad_request("status must be 'watched' or 'want_to_watch'"))?,
        ),
        None => None,
    };

    let records = state
        .watch_status
        .list(user.id, status, params.page, params.limit)
        .await?;
    Ok(Json(records))
}

/// Returns the stored record, or a JSON `null` body when the title has
/// never been marked. Clients treat null as "unmarked", not as an error.
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Option<WatchStatusRecord>>> {
    let record = state.watch_status.get(user.id, movie_id).await?;
    Ok(Json(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.watch_status.delete(user.id, movie_id).await?;
    Ok(Json(json!({ "message": "watch status deleted" })))
}

/// Re-fetch details and credits for one marked title and persist every
/// field that drifted, reporting the per-field diff.
pub async fn fix_metadata(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let Some(mut record) = state.watch_status.get(user.id, movie_id).await? else {
        return Err(AppError::not_found("watch status not found"));
    };

    let kind = MediaKind::from_stored(record.media_type.as_deref());
    let snapshot = fetch_title_snapshot(&state.tmdb, record.movie_id, kind)
        .await
        .map_err(|err| {
            warn!(movie_id, error = %err, "metadata fetch failed for both media types");
            AppError::bad_request("unable to fetch details for this title")
        })?;

    let changes = apply_refresh(&mut record, &snapshot);
    // Even a no-drift refresh persists, so updated_at is always bumped.
    let patch = refresh_patch(&record);
    state.watch_status.update_metadata(record.id, &patch).await?;

    info!(user = %user.username, movie_id, changed = changes.len(), "metadata refreshed");
    Ok(Json(json!({
        "message": "metadata refreshed",
        "movie_title": record.movie_title,
        "media_type": record.media_type,
        "changes_count": changes.len(),
        "changes": changes,
    })))
}

/// Metadata columns of a refreshed record, ready for persistence.
fn refresh_patch(record: &WatchStatusRecord) -> MetadataPatch {
    MetadataPatch {
        media_type: record.media_type.clone(),
        release_date: record.release_date.clone(),
        first_air_date: record.first_air_date.clone(),
        genres: record.genres.clone(),
        production_countries: record.production_countries.clone(),
        vote_average: record.vote_average,
        overview: record.overview.clone(),
        director: record.director.clone(),
        cast_names: record.cast_names.clone(),
    }
}

/// Detail lookup with movie tried first and TV as fallback, mirroring how
/// IDs were originally stored without a media type.
async fn details_with_fallback(state: &AppState, movie_id: i64) -> Option<Details> {
    match state.tmdb.details(MediaKind::Movie, movie_id).await {
        Ok(details) => Some(details),
        Err(_) => state.tmdb.details(MediaKind::Tv, movie_id).await.ok(),
    }
}

async fn credits_with_fallback(state: &AppState, movie_id: i64) -> Option<(MediaKind, Credits)> {
    match state.tmdb.credits(MediaKind::Movie, movie_id).await {
        Ok(credits) => Some((MediaKind::Movie, credits)),
        Err(_) => state
            .tmdb
            .credits(MediaKind::Tv, movie_id)
            .await
            .ok()
            .map(|credits| (MediaKind::Tv, credits)),
    }
}

fn batch_summary(message: &str, updated: usize, failed: usize) -> Json<Value> {
    Json(json!({
        "message": message,
        "updated_count": updated,
        "failed_count": failed,
        "total_processed": updated + failed,
    }))
}

fn empty_batch(message: &str) -> Json<Value> {
    Json(json!({ "message": message, "updated_count": 0 }))
}

fn missing_or_placeholder(value: Option<&str>, placeholder: &str) -> bool {
    match value {
        None => true,
        Some(v) => v.is_empty() || v == placeholder,
    }
}

pub async fn update_production_countries(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Value>> {
    let rows = state
        .watch_status
        .list_missing(user.id, MissingField::ProductionCountries)
        .await?;
    if rows.is_empty() {
        return Ok(empty_batch("all records already have production countries"));
    }

    let mut updated = 0;
    let mut failed = 0;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(BATCH_DELAY).await;
        }
        let Some(details) = details_with_fallback(&state, row.movie_id).await else {
            warn!(movie_id = row.movie_id, "detail lookup failed in both namespaces");
            failed += 1;
            continue;
        };

        // Production countries drive this pass, but the same payload can
        // repair other fields that are still missing.
        let mut patch = MetadataPatch {
            production_countries: Some(countries_display(&details.production_countries)),
            ..MetadataPatch::default()
        };
        if missing_or_placeholder(row.genres.as_deref(), NO_GENRES) {
            patch.genres = Some(genres_display(&details.genres));
        }
        if row.vote_average.unwrap_or(0.0) == 0.0 {
            patch.vote_average = Some(details.vote_average.unwrap_or(0.0));
        }
        if missing_or_placeholder(row.overview.as_deref(), NO_OVERVIEW) {
            patch.overview = Some(
                details
                    .overview
                    .as_deref()
                    .filter(|o| !o.is_empty())
                    .unwrap_or(NO_OVERVIEW)
                    .to_string(),
            );
        }

        match state.watch_status.update_metadata(row.id, &patch).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(movie_id = row.movie_id, error = %err, "patch failed");
                failed += 1;
            }
        }
    }

    info!(user = %user.username, updated, failed, "production country backfill finished");
    Ok(batch_summary("production countries updated", updated, failed))
}

pub async fn update_overview(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Value>> {
    let rows = state
        .watch_status
        .list_missing(user.id, MissingField::Overview)
        .await?;
    if rows.is_empty() {
        return Ok(empty_batch("all records already have an overview"));
    }

    let mut updated = 0;
    let mut failed = 0;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(BATCH_DELAY).await;
        }
        let overview = details_with_fallback(&state, row.movie_id)
            .await
            .and_then(|d| d.overview)
            .filter(|o| !o.is_empty() && o != NO_OVERVIEW);

        let Some(overview) = overview else {
            failed += 1;
            continue;
        };

        let patch = MetadataPatch {
            overview: Some(overview),
            ..MetadataPatch::default()
        };
        match state.watch_status.update_metadata(row.id, &patch).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(movie_id = row.movie_id, error = %err, "patch failed");
                failed += 1;
            }
        }
    }

    info!(user = %user.username, updated, failed, "overview backfill finished");
    Ok(batch_summary("overviews updated", updated, failed))
}

pub async fn update_director(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Value>> {
    let rows = state
        .watch_status
        .list_missing(user.id, MissingField::Director)
        .await?;
    if rows.is_empty() {
        return Ok(empty_batch("all records already have director info"));
    }

    let mut updated = 0;
    let mut failed = 0;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(BATCH_DELAY).await;
        }
        let director = credits_with_fallback(&state, row.movie_id)
            .await
            .and_then(|(kind, credits)| credits.director_for(kind));

        let Some(director) = director else {
            failed += 1;
            continue;
        };

        let patch = MetadataPatch {
            director: Some(director),
            ..MetadataPatch::default()
        };
        match state.watch_status.update_metadata(row.id, &patch).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(movie_id = row.movie_id, error = %err, "patch failed");
                failed += 1;
            }
        }
    }

    info!(user = %user.username, updated, failed, "director backfill finished");
    Ok(batch_summary("directors updated", updated, failed))
}

pub async fn update_cast(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Value>> {
    let rows = state
        .watch_status
        .list_missing(user.id, MissingField::Cast)
        .await?;
    if rows.is_empty() {
        return Ok(empty_batch("all records already have cast info"));
    }

    let mut updated = 0;
    let mut failed = 0;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(BATCH_DELAY).await;
        }
        let cast = credits_with_fallback(&state, row.movie_id)
            .await
            .and_then(|(_, credits)| credits.top_cast());

        let Some(cast) = cast else {
            failed += 1;
            continue;
        };

        let patch = MetadataPatch {
            cast_names: Some(cast),
            ..MetadataPatch::default()
        };
        match state.watch_status.update_metadata(row.id, &patch).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(movie_id = row.movie_id, error = %err, "patch failed");
                failed += 1;
            }
        }
    }

    info!(user = %user.username, updated, failed, "cast backfill finished");
    Ok(batch_summary("cast lists updated", updated, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cinetrack_core::credits::{CastMember, CrewMember};
    use cinetrack_core::locale::{Genre, ProductionCountry};
    use cinetrack_core::reconcile::TitleSnapshot;
    use serde_json::Map;

    #[test]
    fn refresh_persists_even_without_field_drift() {
        let mut record = WatchStatusRecord {
            id: 3,
            user_id: 7,
            movie_id: 550,
            movie_title: "搏击俱乐部".into(),
            poster_path: None,
            status: "watched".into(),
            rating: Some(9),
            notes: None,
            watched_date: None,
            media_type: Some("movie".into()),
            release_date: Some("1999-10-15".into()),
            first_air_date: None,
            genres: Some("剧情".into()),
            production_countries: Some("美国".into()),
            vote_average: Some(8.4),
            overview: Some("一个保险员…".into()),
            director: Some("David Fincher".into()),
            cast_names: Some("Edward Norton".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let snapshot = TitleSnapshot {
            kind: MediaKind::Movie,
            details: Details {
                id: 550,
                title: Some("搏击俱乐部".into()),
                name: None,
                overview: Some("一个保险员…".into()),
                vote_average: Some(8.4),
                release_date: Some("1999-10-15".into()),
                first_air_date: None,
                genres: vec![Genre {
                    id: 18,
                    name: "剧情".into(),
                }],
                production_countries: vec![ProductionCountry {
                    iso_3166_1: Some("US".into()),
                    name: "United States of America".into(),
                }],
                extra: Map::new(),
            },
            credits: Credits {
                crew: vec![CrewMember {
                    name: Some("David Fincher".into()),
                    job: Some("Director".into()),
                }],
                cast: vec![CastMember {
                    name: Some("Edward Norton".into()),
                }],
            },
        };

        let changes = apply_refresh(&mut record, &snapshot);
        assert!(changes.is_empty());

        // The row is written regardless, so updated_at still gets bumped.
        let patch = refresh_patch(&record);
        assert!(!patch.is_empty());
        assert_eq!(patch.media_type.as_deref(), Some("movie"));
        assert_eq!(patch.director.as_deref(), Some("David Fincher"));
    }

    #[test]
    fn placeholder_detection_covers_null_empty_and_placeholder() {
        assert!(missing_or_placeholder(None, NO_OVERVIEW));
        assert!(missing_or_placeholder(Some(""), NO_OVERVIEW));
        assert!(missing_or_placeholder(Some(NO_OVERVIEW), NO_OVERVIEW));
        assert!(!missing_or_placeholder(Some("a real overview"), NO_OVERVIEW));
    }

    #[test]
    fn batch_summary_totals_add_up() {
        let Json(value) = batch_summary("done", 3, 2);
        assert_eq!(value["updated_count"], 3);
        assert_eq!(value["failed_count"], 2);
        assert_eq!(value["total_processed"], 5);
    }
}
