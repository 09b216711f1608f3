//! # Cinetrack Server
//!
//! Backend for a personal movie, TV, and games tracker:
//!
//! - **Discovery**: search and browse against an upstream metadata API,
//!   with localized genres and countries
//! - **Watch status**: per-user marks with denormalized metadata and
//!   batch backfill of missing fields
//! - **Games**: a showcase list merged with a free-to-play catalog
//! - **Accounts**: admin-managed users with JWT bearer auth

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinetrack_server::routes::create_router;
use cinetrack_server::{AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "cinetrack-server")]
#[command(about = "Movie, TV, and games tracking backend")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("database migrations applied");

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server address")?;

    let state = AppState::new(config, pool)?;
    let app = create_router(state);

    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
