//! SQLite Series Repository Implementation

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::media_repository::parse_uuid;
use crate::domain::entities::{Season, Series};
use crate::domain::repositories::SeriesRepository;
use crate::shared::error::RepositoryError;

pub struct SqliteSeriesRepository {
    pool: Pool<Sqlite>,
}

impl SqliteSeriesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn genres_for(&self, series_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT g.name FROM genres g \
             JOIN media_genres mg ON mg.genre_id = g.id \
             WHERE mg.media_id = ? ORDER BY g.name",
        )
        .bind(series_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(RepositoryError::from))
            .collect()
    }

    fn map_row_to_series(
        row: &sqlx::sqlite::SqliteRow,
        genres: Vec<String>,
    ) -> Result<Series, RepositoryError> {
        Ok(Series {
            id: parse_uuid(row.try_get("id")?)?,
            tmdb_id: row.try_get("tmdb_id")?,
            title: row.try_get("title")?,
            overview: row.try_get("overview")?,
            genres,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_row_to_season(row: &sqlx::sqlite::SqliteRow) -> Result<Season, RepositoryError> {
        Ok(Season {
            id: parse_uuid(row.try_get("id")?)?,
            series_id: parse_uuid(row.try_get("series_id")?)?,
            tmdb_id: row.try_get("tmdb_id")?,
            season_number: row.try_get::<i64, _>("season_number")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl SeriesRepository for SqliteSeriesRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Series>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM series WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let genres = self.genres_for(id).await?;
                Ok(Some(Self::map_row_to_series(&row, genres)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Series>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM series ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let id = parse_uuid(row.try_get("id")?)?;
            let genres = self.genres_for(id).await?;
            result.push(Self::map_row_to_series(&row, genres)?);
        }
        Ok(result)
    }

    async fn find_season(&self, id: Uuid) -> Result<Option<Season>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM seasons WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::map_row_to_season(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_seasons(&self, series_id: Uuid) -> Result<Vec<Season>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM seasons WHERE series_id = ? ORDER BY season_number")
            .bind(series_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::map_row_to_season).collect()
    }
}
