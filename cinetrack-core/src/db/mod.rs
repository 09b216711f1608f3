//! Postgres repositories. Each repository owns a pool handle and exposes
//! the queries one domain area needs.

mod favorites;
mod movie_edits;
mod users;
mod watch_status;

pub use favorites::FavoriteRepository;
pub use movie_edits::MovieEditRepository;
pub use users::UserRepository;
pub use watch_status::{MetadataPatch, MissingField, WatchStatusRepository};
