use sqlx::PgPool;

use crate::error::{CoreError, Result};
use crate::models::{Favorite, NewFavorite};

#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a favorite, refreshing the stored title and poster when the pair
    /// already exists.
    pub async fn upsert(&self, user_id: i32, new: &NewFavorite) -> Result<Favorite> {
        let favorite = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (user_id, movie_id, movie_title, poster_path)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                movie_title = EXCLUDED.movie_title,
                poster_path = EXCLUDED.poster_path
            RETURNING id, user_id, movie_id, movie_title, poster_path, created_at
            "#,
        )
        .bind(user_id)
        .bind(new.movie_id)
        .bind(&new.movie_title)
        .bind(&new.poster_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(favorite)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, movie_title, poster_path, created_at \
             FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    pub async fn get(&self, user_id: i32, movie_id: i64) -> Result<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, movie_title, poster_path, created_at \
             FROM favorites WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(favorite)
    }

    pub async fn delete(&self, user_id: i32, movie_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("no favorite for movie {movie_id}")));
        }
        Ok(())
    }
}
