//! Postgres anime store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tokio_stream::StreamExt;

use super::{AnimeStore, AnimeStream};
use crate::{
    error::{AppError, AppResult},
    models::Anime,
};

#[derive(Clone)]
pub struct PgAnimeStore {
    pool: Pool<Postgres>,
}

impl PgAnimeStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnimeStore for PgAnimeStore {
    fn find_all(&self) -> AnimeStream<'_> {
        let rows = sqlx::query_as::<_, Anime>("SELECT id, name FROM anime ORDER BY id")
            .fetch(&self.pool)
            .map(|row| row.map_err(AppError::from));
        Box::pin(rows)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Anime>> {
        let row = sqlx::query_as::<_, Anime>("SELECT id, name FROM anime WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn save(&self, anime: Anime) -> AppResult<Anime> {
        match anime.id {
            None => {
                let row = sqlx::query_as::<_, Anime>(
                    "INSERT INTO anime (name) VALUES ($1) RETURNING id, name",
                )
                .bind(&anime.name)
                .fetch_one(&self.pool)
                .await?;
                Ok(row)
            }
            Some(id) => sqlx::query_as::<_, Anime>(
                "UPDATE anime SET name = $2 WHERE id = $1 RETURNING id, name",
            )
            .bind(id)
            .bind(&anime.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Anime {} not found", id))),
        }
    }

    async fn save_all(&self, animes: Vec<Anime>) -> AppResult<Vec<Anime>> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(animes.len());

        for anime in &animes {
            let row = sqlx::query_as::<_, Anime>(
                "INSERT INTO anime (name) VALUES ($1) RETURNING id, name",
            )
            .bind(&anime.name)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(row);
        }

        // Dropping `tx` on an early return above rolls the batch back
        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM anime WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
