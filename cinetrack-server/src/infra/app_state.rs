use std::{fmt, sync::Arc};

use sqlx::PgPool;

use cinetrack_core::db::{
    FavoriteRepository, MovieEditRepository, UserRepository, WatchStatusRepository,
};
use cinetrack_core::games::FreeToGameClient;
use cinetrack_core::tmdb::TmdbClient;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tmdb: Arc<TmdbClient>,
    pub games: Arc<FreeToGameClient>,
    pub users: UserRepository,
    pub watch_status: WatchStatusRepository,
    pub favorites: FavoriteRepository,
    pub movie_edits: MovieEditRepository,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let tmdb = TmdbClient::new(&config.tmdb_base_url, &config.tmdb_api_key)?;
        let games = FreeToGameClient::new(&config.freetogame_base_url)?;

        Ok(Self {
            config: Arc::new(config),
            tmdb: Arc::new(tmdb),
            games: Arc::new(games),
            users: UserRepository::new(pool.clone()),
            watch_status: WatchStatusRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            movie_edits: MovieEditRepository::new(pool),
        })
    }
}
