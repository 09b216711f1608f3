use std::collections::HashSet;

use sqlx::PgPool;

use crate::error::{CoreError, Result};
use crate::locale::{NO_CAST, NO_COUNTRIES, NO_DIRECTOR, NO_OVERVIEW};
use crate::models::{NewWatchStatus, WatchState, WatchStatusRecord};

const RECORD_COLUMNS: &str = "id, user_id, movie_id, movie_title, poster_path, status, \
     rating, notes, watched_date, media_type, release_date, first_air_date, genres, \
     production_countries, vote_average, overview, director, cast_names, created_at, updated_at";

/// Metadata columns a refresh may replace. `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub media_type: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub genres: Option<String>,
    pub production_countries: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
    pub director: Option<String>,
    pub cast_names: Option<String>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none()
            && self.release_date.is_none()
            && self.first_air_date.is_none()
            && self.genres.is_none()
            && self.production_countries.is_none()
            && self.vote_average.is_none()
            && self.overview.is_none()
            && self.director.is_none()
            && self.cast_names.is_none()
    }
}

/// Denormalized columns the backfill passes repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    ProductionCountries,
    Overview,
    Director,
    Cast,
}

impl MissingField {
    fn column(self) -> &'static str {
        match self {
            MissingField::ProductionCountries => "production_countries",
            MissingField::Overview => "overview",
            MissingField::Director => "director",
            MissingField::Cast => "cast_names",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            MissingField::ProductionCountries => NO_COUNTRIES,
            MissingField::Overview => NO_OVERVIEW,
            MissingField::Director => NO_DIRECTOR,
            MissingField::Cast => NO_CAST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchStatusRepository {
    pool: PgPool,
}

impl WatchStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a user's record for a title in one statement, so
    /// concurrent marks of the same title cannot race into duplicates.
    pub async fn upsert(&self, user_id: i32, new: &NewWatchStatus) -> Result<WatchStatusRecord> {
        let record = sqlx::query_as::<_, WatchStatusRecord>(&format!(
            r#"
            INSERT INTO watch_status (
                user_id, movie_id, movie_title, poster_path, status, rating, notes,
                watched_date, media_type, release_date, first_air_date, genres,
                production_countries, vote_average, overview, director, cast_names
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                movie_title = EXCLUDED.movie_title,
                poster_path = EXCLUDED.poster_path,
                status = EXCLUDED.status,
                rating = EXCLUDED.rating,
                notes = EXCLUDED.notes,
                watched_date = EXCLUDED.watched_date,
                media_type = EXCLUDED.media_type,
                release_date = EXCLUDED.release_date,
                first_air_date = EXCLUDED.first_air_date,
                genres = EXCLUDED.genres,
                production_countries = EXCLUDED.production_countries,
                vote_average = EXCLUDED.vote_average,
                overview = EXCLUDED.overview,
                director = EXCLUDED.director,
                cast_names = EXCLUDED.cast_names,
                updated_at = NOW()
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(new.movie_id)
        .bind(&new.movie_title)
        .bind(&new.poster_path)
        .bind(&new.status)
        .bind(new.rating)
        .bind(&new.notes)
        .bind(new.watched_date)
        .bind(&new.media_type)
        .bind(&new.release_date)
        .bind(&new.first_air_date)
        .bind(&new.genres)
        .bind(&new.production_countries)
        .bind(new.vote_average)
        .bind(&new.overview)
        .bind(&new.director)
        .bind(&new.cast_names)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn list(
        &self,
        user_id: i32,
        status: Option<WatchState>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<WatchStatusRecord>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
        let records = match status {
            Some(state) => {
                sqlx::query_as::<_, WatchStatusRecord>(&format!(
                    "SELECT {RECORD_COLUMNS} FROM watch_status \
                     WHERE user_id = $1 AND status = $2 \
                     ORDER BY updated_at DESC LIMIT $3 OFFSET $4"
                ))
                .bind(user_id)
                .bind(state.as_str())
                .bind(i64::from(limit))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WatchStatusRecord>(&format!(
                    "SELECT {RECORD_COLUMNS} FROM watch_status \
                     WHERE user_id = $1 \
                     ORDER BY updated_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(user_id)
                .bind(i64::from(limit))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(records)
    }

    pub async fn get(&self, user_id: i32, movie_id: i64) -> Result<Option<WatchStatusRecord>> {
        let record = sqlx::query_as::<_, WatchStatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM watch_status WHERE user_id = $1 AND movie_id = $2"
        ))
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Delete a user's record for one title. `NotFound` when nothing matched.
    pub async fn delete(&self, user_id: i32, movie_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM watch_status WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("no watch status for movie {movie_id}")));
        }
        Ok(())
    }

    /// All title IDs a user has marked, for exclusion during discovery.
    pub async fn marked_movie_ids(&self, user_id: i32) -> Result<HashSet<i64>> {
        let ids: Vec<(i64,)> =
            sqlx::query_as("SELECT movie_id FROM watch_status WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// A user's rows whose denormalized column is absent, blank, or still
    /// the placeholder.
    pub async fn list_missing(
        &self,
        user_id: i32,
        field: MissingField,
    ) -> Result<Vec<WatchStatusRecord>> {
        let column = field.column();
        let records = sqlx::query_as::<_, WatchStatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM watch_status \
             WHERE user_id = $1 AND ({column} IS NULL OR {column} = '' OR {column} = $2) \
             ORDER BY id"
        ))
        .bind(user_id)
        .bind(field.placeholder())
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Apply a refresh patch to one row. Columns absent from the patch keep
    /// their current value.
    pub async fn update_metadata(&self, id: i32, patch: &MetadataPatch) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE watch_status SET
                media_type = COALESCE($2, media_type),
                release_date = COALESCE($3, release_date),
                first_air_date = COALESCE($4, first_air_date),
                genres = COALESCE($5, genres),
                production_countries = COALESCE($6, production_countries),
                vote_average = COALESCE($7, vote_average),
                overview = COALESCE($8, overview),
                director = COALESCE($9, director),
                cast_names = COALESCE($10, cast_names),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.media_type)
        .bind(&patch.release_date)
        .bind(&patch.first_air_date)
        .bind(&patch.genres)
        .bind(&patch.production_countries)
        .bind(patch.vote_average)
        .bind(&patch.overview)
        .bind(&patch.director)
        .bind(&patch.cast_names)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
