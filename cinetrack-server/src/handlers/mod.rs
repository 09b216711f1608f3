pub mod favorites;
pub mod games;
pub mod health;
pub mod movie_edits;
pub mod movies;
pub mod users;
pub mod watch_status;
