//! Core domain for the movie tracker backend: upstream metadata clients,
//! credit extraction, localization, discovery aggregation, metadata
//! reconciliation, and the Postgres repositories.

pub mod aggregate;
pub mod credits;
pub mod db;
pub mod error;
pub mod games;
pub mod locale;
pub mod models;
pub mod reconcile;
pub mod tmdb;

pub use error::{CoreError, Result};
