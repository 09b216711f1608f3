use sqlx::PgPool;

use crate::error::{CoreError, Result};
use crate::models::{MovieEdit, NewMovieEdit};

const EDIT_COLUMNS: &str = "id, user_id, movie_id, movie_title, custom_background_time, \
     custom_genre, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct MovieEditRepository {
    pool: PgPool,
}

impl MovieEditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create or replace a user's edits for one title.
    pub async fn upsert(&self, user_id: i32, new: &NewMovieEdit) -> Result<MovieEdit> {
        let edit = sqlx::query_as::<_, MovieEdit>(&format!(
            r#"
            INSERT INTO movie_edits (
                user_id, movie_id, movie_title, custom_background_time, custom_genre, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                movie_title = EXCLUDED.movie_title,
                custom_background_time = EXCLUDED.custom_background_time,
                custom_genre = EXCLUDED.custom_genre,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING {EDIT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(new.movie_id)
        .bind(&new.movie_title)
        .bind(&new.custom_background_time)
        .bind(&new.custom_genre)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(edit)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<MovieEdit>> {
        let edits = sqlx::query_as::<_, MovieEdit>(&format!(
            "SELECT {EDIT_COLUMNS} FROM movie_edits \
             WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(edits)
    }

    pub async fn get(&self, user_id: i32, movie_id: i64) -> Result<Option<MovieEdit>> {
        let edit = sqlx::query_as::<_, MovieEdit>(&format!(
            "SELECT {EDIT_COLUMNS} FROM movie_edits WHERE user_id = $1 AND movie_id = $2"
        ))
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(edit)
    }

    pub async fn delete(&self, user_id: i32, movie_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM movie_edits WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("no edits for movie {movie_id}")));
        }
        Ok(())
    }
}
