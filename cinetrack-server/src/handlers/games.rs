//! Game listings: a built-in showcase list merged with the free-to-play
//! catalog, filtered and paginated locally.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use cinetrack_core::games::{showcase_games, GameEntry, CATALOG_ID_OFFSET};

use crate::errors::{AppError, AppResult};
use crate::AppState;

const PAGE_SIZE: usize = 20;

/// Genre slugs that only exist in the showcase list; passing them upstream
/// as a category would return an empty catalog.
const SHOWCASE_ONLY_GENRES: [&str; 2] = ["action-rpg", "action-adventure"];

/// Platform filters the upstream catalog understands natively.
const UPSTREAM_PLATFORMS: [&str; 2] = ["pc", "web-browser"];

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn paginate(games: Vec<GameEntry>, page: u32) -> Json<Value> {
    let count = games.len();
    let start = (page.max(1) as usize - 1) * PAGE_SIZE;
    let results: Vec<GameEntry> = games.into_iter().skip(start).take(PAGE_SIZE).collect();
    Json(json!({ "count": count, "results": results }))
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Value>> {
    let mut games = showcase_games();

    // The catalog is best-effort; the showcase list alone is a valid page.
    match state.games.games(None, None).await {
        Ok(catalog) => games.extend(catalog.into_iter().map(GameEntry::from_catalog)),
        Err(err) => warn!(error = %err, "catalog unavailable, serving showcase only"),
    }

    Ok(paginate(games, params.page))
}

#[derive(Debug, Deserialize)]
pub struct SearchGamesParams {
    pub search: Option<String>,
    pub genres: Option<String>,
    pub platforms: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchGamesParams>,
) -> AppResult<Json<Value>> {
    let mut games = showcase_games();

    let category = params
        .genres
        .as_deref()
        .filter(|g| !SHOWCASE_ONLY_GENRES.contains(g));
    let platform = params
        .platforms
        .as_deref()
        .filter(|p| UPSTREAM_PLATFORMS.contains(p));

    match state.games.games(category, platform).await {
        Ok(catalog) => games.extend(catalog.into_iter().map(GameEntry::from_catalog)),
        Err(err) => warn!(error = %err, "catalog unavailable, searching showcase only"),
    }

    if let Some(search) = params.search.as_deref() {
        let term = search.to_lowercase();
        games.retain(|game| {
            game.name.to_lowercase().contains(&term)
                || game.description_raw.to_lowercase().contains(&term)
        });
    }

    if let Some(genres) = params.genres.as_deref() {
        let lowered = genres.to_lowercase();
        games.retain(|game| {
            game.genres
                .iter()
                .any(|g| g.slug == genres || g.name.to_lowercase().contains(&lowered))
        });
    }

    if let Some(platforms) = params.platforms.as_deref() {
        let term = platforms.to_lowercase();
        games.retain(|game| {
            game.platforms
                .iter()
                .any(|p| p.platform.slug.contains(&term))
        });
    }

    Ok(paginate(games, params.page))
}

pub async fn genres() -> Json<Value> {
    let genres = [
        ("action-rpg", "Action RPG"),
        ("action-adventure", "Action Adventure"),
        ("mmorpg", "MMORPG"),
        ("shooter", "Shooter"),
        ("strategy", "Strategy"),
        ("moba", "MOBA"),
        ("racing", "Racing"),
        ("sports", "Sports"),
        ("simulation", "Simulation"),
        ("puzzle", "Puzzle"),
        ("platform", "Platform"),
        ("fighting", "Fighting"),
        ("horror", "Horror"),
        ("survival", "Survival"),
        ("battle-royale", "Battle Royale"),
        ("card", "Card Game"),
        ("sandbox", "Sandbox"),
        ("open-world", "Open World"),
    ];

    let results: Vec<Value> = genres
        .iter()
        .map(|(slug, name)| json!({ "id": slug, "name": name, "slug": slug }))
        .collect();
    Json(json!({ "results": results }))
}

/// Showcase IDs resolve locally; offset IDs resolve against the catalog.
pub async fn detail(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> AppResult<Json<GameEntry>> {
    if let Some(game) = showcase_games().into_iter().find(|g| g.id == game_id) {
        return Ok(Json(game));
    }

    if game_id > CATALOG_ID_OFFSET {
        let game = state
            .games
            .game(game_id - CATALOG_ID_OFFSET)
            .await
            .map_err(|err| {
                warn!(game_id, error = %err, "catalog detail lookup failed");
                AppError::not_found("game not found")
            })?;
        return Ok(Json(GameEntry::from_catalog(game)));
    }

    Err(AppError::not_found("game not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_reports_full_count() {
        let games: Vec<GameEntry> = std::iter::repeat_with(showcase_games)
            .take(8)
            .flatten()
            .collect();
        let total = games.len();

        let Json(value) = paginate(games, 2);
        assert_eq!(value["count"], total as u64);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(PAGE_SIZE));
    }

    #[test]
    fn last_page_is_partial() {
        let games = showcase_games();
        let Json(value) = paginate(games, 1);
        assert_eq!(value["count"], 6);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(6));

        let Json(value) = paginate(showcase_games(), 2);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn showcase_genre_filters_never_hit_upstream() {
        assert!(SHOWCASE_ONLY_GENRES.contains(&"action-rpg"));
        assert!(!SHOWCASE_ONLY_GENRES.contains(&"mmorpg"));
    }
}
