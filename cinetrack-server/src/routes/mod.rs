use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::middleware::{admin_middleware, auth_middleware, optional_auth_middleware};
use crate::handlers::{favorites, games, health, movie_edits, movies, users, watch_status};
use crate::AppState;

/// Build the full application router, nested under `/api`.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .merge(create_user_routes(state.clone()))
        .merge(create_movie_routes(state.clone()))
        .merge(create_watch_status_routes(state.clone()))
        .merge(create_movie_edit_routes(state.clone()))
        .merge(create_favorite_routes(state.clone()))
        .merge(create_game_routes());

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn create_user_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/users/admin/create-user", post(users::create_user))
        .route("/users/admin/users", get(users::list_users))
        .route("/users/admin/users/{user_id}", delete(users::delete_user))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/users/login", post(users::login))
        .merge(admin)
        .merge(
            Router::new()
                .route("/users/change-password", post(users::change_password))
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

fn create_movie_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/movies/genres", get(movies::genres))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/popular/movies", get(movies::popular_movies))
        .route("/movies/popular/tv", get(movies::popular_tv))
        .route("/movies/{movie_id}", get(movies::detail))
        .route_layer(middleware::from_fn_with_state(
            state,
            optional_auth_middleware,
        ))
}

fn create_watch_status_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/watch-status",
            post(watch_status::upsert).get(watch_status::list),
        )
        .route(
            "/watch-status/update-production-countries",
            post(watch_status::update_production_countries),
        )
        .route(
            "/watch-status/update-overview",
            post(watch_status::update_overview),
        )
        .route(
            "/watch-status/update-director",
            post(watch_status::update_director),
        )
        .route(
            "/watch-status/update-cast",
            post(watch_status::update_cast),
        )
        .route(
            "/watch-status/{movie_id}/fix-metadata",
            post(watch_status::fix_metadata),
        )
        .route(
            "/watch-status/{movie_id}",
            get(watch_status::get).delete(watch_status::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn create_movie_edit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/movie-edits",
            post(movie_edits::upsert).get(movie_edits::list),
        )
        .route(
            "/movie-edits/{movie_id}",
            get(movie_edits::get).delete(movie_edits::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn create_favorite_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/favorites", post(favorites::upsert).get(favorites::list))
        .route(
            "/favorites/{movie_id}",
            get(favorites::get).delete(favorites::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn create_game_routes() -> Router<AppState> {
    Router::new()
        .route("/games/popular", get(games::popular))
        .route("/games/search", get(games::search))
        .route("/games/genres", get(games::genres))
        .route("/games/{game_id}", get(games::detail))
}
