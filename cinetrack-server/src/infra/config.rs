use std::env;

use anyhow::Context;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,

    pub database_url: String,
    pub max_db_connections: u32,

    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub freetogame_base_url: String,

    pub jwt_secret: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),

            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_db_connections: env::var("MAX_DB_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            tmdb_api_key: env::var("TMDB_API_KEY").context("TMDB_API_KEY must be set")?,
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| cinetrack_core::tmdb::DEFAULT_BASE_URL.to_string()),
            freetogame_base_url: env::var("FREETOGAME_BASE_URL")
                .unwrap_or_else(|_| cinetrack_core::games::DEFAULT_BASE_URL.to_string()),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| {
                    "http://localhost:3000,http://localhost:5173".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }
}
