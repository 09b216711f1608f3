//! Search, discovery, and detail endpoints backed by the metadata upstream.
//!
//! Search requests double as discovery requests: with a query they hit the
//! upstream search endpoints, without one they hit discover with the built
//! filter set. The compound media types (animation, anime, documentary,
//! variety, live-action) expand into genre filters in discover mode and into
//! per-result detail checks in search mode.

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use cinetrack_core::aggregate::{collect_unmarked, TmdbListing, SEARCH_PAGE_BUDGET, TARGET_COUNT};
use cinetrack_core::credits::MediaKind;
use cinetrack_core::locale::{genres_from_ids, Genre};
use cinetrack_core::models::User;
use cinetrack_core::tmdb::SearchItem;
use cinetrack_core::CoreError;

use crate::errors::{AppError, AppResult};
use crate::AppState;

const ANIMATION_GENRE: i64 = 16;
const DOCUMENTARY_GENRE: i64 = 99;
const VARIETY_GENRES: [i64; 2] = [10767, 10764];

/// Origin countries excluded when the region filter asks for "OTHER".
const MAJOR_ORIGIN_COUNTRIES: &str = "CN,HK,TW,US,KR,JP,FR,IT,GB,DE,IN,TH";

const COMPOUND_TYPES: [&str; 6] = [
    "animation",
    "anime",
    "documentary",
    "variety",
    "live_action_movie",
    "live_action_tv",
];

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "mediaType", default = "default_media_type")]
    pub media_type: String,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "sortBy", default = "default_sort")]
    pub sort_by: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(rename = "excludeMarked", default)]
    pub exclude_marked: bool,
}

fn default_media_type() -> String {
    "movie".to_string()
}

fn default_sort() -> String {
    "popularity.desc".to_string()
}

fn default_page() -> u32 {
    1
}

/// The concrete upstream namespace a compound type resolves to.
fn base_media_type(media_type: &str) -> &str {
    match media_type {
        "animation" | "documentary" | "live_action_movie" => "movie",
        "anime" | "variety" | "live_action_tv" => "tv",
        other => other,
    }
}

/// Genre IDs a compound type seeds into the discover filter, prepended to
/// any caller-supplied genre filter.
fn seeded_genre_filter(media_type: &str, genre: Option<&str>) -> Option<String> {
    let seed = match media_type {
        "animation" | "anime" => Some("16"),
        "documentary" => Some("99"),
        "variety" => Some("10767,10764"),
        _ => None,
    };

    match (seed, genre) {
        (Some(seed), Some(genre)) if !genre.is_empty() => Some(format!("{seed},{genre}")),
        (Some(seed), _) => Some(seed.to_string()),
        (None, Some(genre)) if !genre.is_empty() => Some(genre.to_string()),
        (None, _) => None,
    }
}

fn push_year_params(params: &mut Vec<(String, String)>, year: &str, tv: bool) {
    let (lte, gte, exact) = if tv {
        ("first_air_date.lte", "first_air_date.gte", "first_air_date_year")
    } else {
        (
            "primary_release_date.lte",
            "primary_release_date.gte",
            "primary_release_year",
        )
    };

    if year == "before_1960" {
        params.push((lte.into(), "1959-12-31".into()));
    } else if let Some((start, end)) = year.split_once('-') {
        params.push((gte.into(), format!("{start}-01-01")));
        params.push((lte.into(), format!("{end}-12-31")));
    } else {
        params.push((exact.into(), year.into()));
    }
}

/// A result row plus the resolved genre list used for compound-type
/// filtering before serialization.
struct EnrichedItem {
    kind: MediaKind,
    genres: Vec<Genre>,
    value: Value,
}

fn enrich(item: &SearchItem, genres: Vec<Genre>) -> EnrichedItem {
    let kind = item.inferred_kind();
    let mut value = serde_json::to_value(item).unwrap_or_else(|_| Value::Object(Map::new()));
    if let Value::Object(map) = &mut value {
        map.insert(
            "genres".into(),
            serde_json::to_value(&genres).unwrap_or_default(),
        );
    }
    EnrichedItem {
        kind,
        genres,
        value,
    }
}

impl EnrichedItem {
    fn has_genre(&self, id: i64) -> bool {
        self.genres.iter().any(|g| g.id == id)
    }
}

pub async fn search(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Value>> {
    let user = user.map(|Extension(u)| u);
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    let search_mode = query.is_some();
    let compound = COMPOUND_TYPES.contains(&params.media_type.as_str());

    let mut marked: HashSet<i64> = HashSet::new();
    if params.exclude_marked {
        if let Some(user) = &user {
            marked = state.watch_status.marked_movie_ids(user.id).await?;
            debug!(user = %user.username, marked = marked.len(), "excluding marked titles");
        }
    }

    let mut upstream_params: Vec<(String, String)> =
        vec![("include_adult".into(), "false".into())];
    let path;

    if let Some(query) = query {
        let base = base_media_type(&params.media_type);
        path = if base == "all" {
            "/search/multi".to_string()
        } else {
            format!("/search/{base}")
        };
        upstream_params.push(("query".into(), query.to_string()));
    } else {
        let base = base_media_type(&params.media_type);
        let tv = base == "tv";
        path = if tv {
            "/discover/tv".to_string()
        } else {
            "/discover/movie".to_string()
        };
        upstream_params.push(("sort_by".into(), params.sort_by.clone()));

        if let Some(year) = params.year.as_deref() {
            push_year_params(&mut upstream_params, year, tv);
        }

        if let Some(filter) = seeded_genre_filter(&params.media_type, params.genre.as_deref()) {
            upstream_params.push(("with_genres".into(), filter));
        }

        if let Some(region) = params.region.as_deref() {
            if region == "OTHER" {
                upstream_params
                    .push(("without_origin_country".into(), MAJOR_ORIGIN_COUNTRIES.into()));
            } else {
                upstream_params.push(("with_origin_country".into(), region.into()));
            }
        }
    }

    // Multi-page aggregation only pays off when there is something to skip.
    let listing = TmdbListing::new(&state.tmdb, path.clone(), upstream_params.clone());
    let (items, total_pages, total_results) =
        if params.exclude_marked && user.is_some() && !marked.is_empty() {
            let aggregated =
                collect_unmarked(&listing, params.page, TARGET_COUNT, &marked, SEARCH_PAGE_BUDGET)
                    .await;
            (
                aggregated.items,
                json!(aggregated.total_pages),
                json!(aggregated.total_results),
            )
        } else {
            let page = state
                .tmdb
                .fetch_page(&path, &upstream_params, params.page)
                .await?;
            (page.results, json!(page.total_pages), json!(page.total_results))
        };

    // Compound types in search mode need per-result details, because the
    // search endpoints return no genre information to filter on.
    let mut enriched: Vec<EnrichedItem> = Vec::new();
    if search_mode && compound {
        for item in items.iter().take(TARGET_COUNT) {
            let kind = item.inferred_kind();
            match state.tmdb.details(kind, item.id).await {
                Ok(details) => enriched.push(enrich(item, details.genres)),
                Err(err) => {
                    warn!(id = item.id, error = %err, "detail lookup failed, using genre ids");
                    enriched.push(enrich(item, genres_from_ids(&item.genre_ids)));
                }
            }
        }
    } else {
        for item in items.iter().take(TARGET_COUNT) {
            enriched.push(enrich(item, genres_from_ids(&item.genre_ids)));
        }
        if params.media_type == "live_action_movie" || params.media_type == "live_action_tv" {
            enriched.retain(|item| !item.has_genre(ANIMATION_GENRE));
        }
    }

    if search_mode {
        match params.media_type.as_str() {
            "animation" => enriched.retain(|item| item.has_genre(ANIMATION_GENRE)),
            "anime" => enriched
                .retain(|item| item.has_genre(ANIMATION_GENRE) && item.kind == MediaKind::Tv),
            "documentary" => enriched.retain(|item| item.has_genre(DOCUMENTARY_GENRE)),
            "variety" => {
                enriched.retain(|item| VARIETY_GENRES.iter().any(|id| item.has_genre(*id)))
            }
            "live_action_movie" => enriched.retain(|item| {
                item.kind == MediaKind::Movie && !item.has_genre(ANIMATION_GENRE)
            }),
            "live_action_tv" => enriched
                .retain(|item| item.kind == MediaKind::Tv && !item.has_genre(ANIMATION_GENRE)),
            _ => {}
        }
    }

    let results: Vec<Value> = enriched.into_iter().map(|item| item.value).collect();
    Ok(Json(json!({
        "results": results,
        "total_pages": total_pages,
        "total_results": total_results,
        "page": params.page,
    })))
}

pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let movie_genres = state.tmdb.genres(MediaKind::Movie).await?;
    let tv_genres = state.tmdb.genres(MediaKind::Tv).await?;

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for genre in movie_genres.into_iter().chain(tv_genres) {
        if seen.insert(genre.id) {
            merged.push(genre);
        }
    }

    Ok(Json(merged))
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> AppResult<Json<Value>> {
    popular_for(&state, &params.media_type, params.page).await
}

pub async fn popular_movies(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> AppResult<Json<Value>> {
    popular_for(&state, "movie", params.page).await
}

pub async fn popular_tv(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> AppResult<Json<Value>> {
    popular_for(&state, "tv", params.page).await
}

async fn popular_for(state: &AppState, media_type: &str, page: u32) -> AppResult<Json<Value>> {
    let path = if media_type == "tv" {
        "/tv/popular"
    } else {
        "/movie/popular"
    };

    let fetched = state.tmdb.fetch_page(path, &[], page).await?;

    let results: Vec<Value> = fetched
        .results
        .iter()
        .map(|item| {
            let mut value =
                serde_json::to_value(item).unwrap_or_else(|_| Value::Object(Map::new()));
            if let Value::Object(map) = &mut value {
                map.insert(
                    "genres".into(),
                    serde_json::to_value(genres_from_ids(&item.genre_ids)).unwrap_or_default(),
                );
                map.insert("media_type".into(), json!(media_type));
            }
            value
        })
        .collect();

    Ok(Json(json!({
        "page": fetched.page,
        "total_pages": fetched.total_pages,
        "total_results": fetched.total_results,
        "results": results,
        "media_type": media_type,
    })))
}

/// Detail lookup with the movie namespace tried first and TV as fallback;
/// IDs are not unique across the two.
pub async fn detail(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    match state.tmdb.details(MediaKind::Movie, movie_id).await {
        Ok(details) => return Ok(Json(with_media_type(details, MediaKind::Movie))),
        Err(err) => {
            debug!(id = movie_id, error = %err, "movie detail failed, trying tv");
        }
    }

    match state.tmdb.details(MediaKind::Tv, movie_id).await {
        Ok(details) => Ok(Json(with_media_type(details, MediaKind::Tv))),
        Err(CoreError::UpstreamStatus { .. }) => {
            Err(AppError::not_found("movie or tv show not found"))
        }
        Err(err) => Err(err.into()),
    }
}

fn with_media_type(details: cinetrack_core::tmdb::Details, kind: MediaKind) -> Value {
    let mut value = serde_json::to_value(&details).unwrap_or_else(|_| Value::Object(Map::new()));
    if let Value::Object(map) = &mut value {
        map.insert("media_type".into(), json!(kind.as_str()));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_types_resolve_to_upstream_namespaces() {
        assert_eq!(base_media_type("animation"), "movie");
        assert_eq!(base_media_type("anime"), "tv");
        assert_eq!(base_media_type("variety"), "tv");
        assert_eq!(base_media_type("live_action_movie"), "movie");
        assert_eq!(base_media_type("tv"), "tv");
        assert_eq!(base_media_type("all"), "all");
    }

    #[test]
    fn genre_seeds_prepend_caller_filter() {
        assert_eq!(seeded_genre_filter("animation", None).as_deref(), Some("16"));
        assert_eq!(
            seeded_genre_filter("variety", Some("35")).as_deref(),
            Some("10767,10764,35")
        );
        assert_eq!(seeded_genre_filter("movie", Some("18")).as_deref(), Some("18"));
        assert_eq!(seeded_genre_filter("live_action_tv", None), None);
    }

    #[test]
    fn year_filters_cover_exact_range_and_cutoff() {
        let mut params = Vec::new();
        push_year_params(&mut params, "1995", false);
        assert_eq!(params, vec![("primary_release_year".to_string(), "1995".to_string())]);

        let mut params = Vec::new();
        push_year_params(&mut params, "1990-1999", true);
        assert_eq!(
            params,
            vec![
                ("first_air_date.gte".to_string(), "1990-01-01".to_string()),
                ("first_air_date.lte".to_string(), "1999-12-31".to_string()),
            ]
        );

        let mut params = Vec::new();
        push_year_params(&mut params, "before_1960", false);
        assert_eq!(
            params,
            vec![("primary_release_date.lte".to_string(), "1959-12-31".to_string())]
        );
    }
}
