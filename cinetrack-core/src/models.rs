//! Persistent domain records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account. `password_hash` never leaves the backend; the serialized
/// shape skips it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Watch-status values accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Watched,
    WantToWatch,
}

impl WatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            WatchState::Watched => "watched",
            WatchState::WantToWatch => "want_to_watch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "watched" => Some(WatchState::Watched),
            "want_to_watch" => Some(WatchState::WantToWatch),
            _ => None,
        }
    }
}

/// One user's record for one title, including the denormalized upstream
/// metadata snapshot. Unique per (user_id, movie_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WatchStatusRecord {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i64,
    pub movie_title: String,
    pub poster_path: Option<String>,
    pub status: String,
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub watched_date: Option<DateTime<Utc>>,
    pub media_type: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub genres: Option<String>,
    pub production_countries: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
    pub director: Option<String>,
    #[serde(rename = "cast")]
    pub cast_names: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client supplies when marking a title.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWatchStatus {
    pub movie_id: i64,
    pub movie_title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    pub status: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub watched_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub production_countries: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default, rename = "cast")]
    pub cast_names: Option<String>,
}

/// A minimal per-user favorite. Unique per (user_id, movie_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i64,
    pub movie_title: String,
    pub poster_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFavorite {
    pub movie_id: i64,
    pub movie_title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Free-text per-user edits for a title. Unique per (user_id, movie_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MovieEdit {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i64,
    pub movie_title: String,
    pub custom_background_time: Option<String>,
    pub custom_genre: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovieEdit {
    pub movie_id: i64,
    pub movie_title: String,
    #[serde(default)]
    pub custom_background_time: Option<String>,
    #[serde(default)]
    pub custom_genre: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_state_round_trips() {
        assert_eq!(WatchState::parse("watched"), Some(WatchState::Watched));
        assert_eq!(
            WatchState::parse("want_to_watch"),
            Some(WatchState::WantToWatch)
        );
        assert_eq!(WatchState::parse("dropped"), None);
        assert_eq!(WatchState::WantToWatch.as_str(), "want_to_watch");
    }

    #[test]
    fn cast_column_serializes_as_cast() {
        let json = serde_json::to_value(WatchStatusRecord {
            id: 1,
            user_id: 1,
            movie_id: 603,
            movie_title: "黑客帝国".into(),
            poster_path: None,
            status: "watched".into(),
            rating: Some(9),
            notes: None,
            watched_date: None,
            media_type: Some("movie".into()),
            release_date: Some("1999-03-30".into()),
            first_air_date: None,
            genres: Some("动作, 科幻".into()),
            production_countries: Some("美国".into()),
            vote_average: Some(8.2),
            overview: None,
            director: None,
            cast_names: Some("Keanu Reeves".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["cast"], "Keanu Reeves");
        assert!(json.get("cast_names").is_none());
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let json = serde_json::to_value(User {
            id: 1,
            username: "ming".into(),
            email: "ming@example.com".into(),
            password_hash: "argon2-hash".into(),
            is_admin: false,
            created_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["username"], "ming");
        assert!(json.get("password_hash").is_none());
    }
}
