//! HTTP surface for the cinetrack backend: routing, authentication,
//! and request handlers over the core domain crate.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use infra::config::Config;
