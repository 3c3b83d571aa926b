//! SQLite Media Repository Implementation
//!
//! Watchable persistence. Upserts are keyed on the external title id so
//! re-ingesting the same title is idempotent and keeps row ids stable.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::domain::entities::{Episode, MediaContainer, Movie, Season, Series};
use crate::domain::repositories::MediaRepository;
use crate::domain::value_objects::Resolution;
use crate::shared::error::RepositoryError;

pub(super) fn parse_uuid(raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw).map_err(|e| RepositoryError::Serialization(format!("bad uuid: {e}")))
}

/// SQLite implementation of MediaRepository
pub struct SqliteMediaRepository {
    pool: Pool<Sqlite>,
}

impl SqliteMediaRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_row_to_movie(
        row: &sqlx::sqlite::SqliteRow,
        genres: Vec<String>,
    ) -> Result<Movie, RepositoryError> {
        Ok(Movie {
            id: parse_uuid(row.try_get("id")?)?,
            tmdb_id: row.try_get("tmdb_id")?,
            title: row.try_get("title")?,
            overview: row.try_get("overview")?,
            release_year: row.try_get("release_year")?,
            genres,
            source_path: row.try_get("source_path")?,
            resolution: Resolution::new(
                row.try_get::<i64, _>("width")? as u32,
                row.try_get::<i64, _>("height")? as u32,
            ),
            duration_secs: row.try_get("duration_secs")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_row_to_episode(row: &sqlx::sqlite::SqliteRow) -> Result<Episode, RepositoryError> {
        Ok(Episode {
            id: parse_uuid(row.try_get("id")?)?,
            tmdb_id: row.try_get("tmdb_id")?,
            season_id: parse_uuid(row.try_get("season_id")?)?,
            episode_number: row.try_get::<i64, _>("episode_number")? as u32,
            title: row.try_get("title")?,
            source_path: row.try_get("source_path")?,
            resolution: Resolution::new(
                row.try_get::<i64, _>("width")? as u32,
                row.try_get::<i64, _>("height")? as u32,
            ),
            duration_secs: row.try_get("duration_secs")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
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

    async fn genres_for(&self, media_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT g.name FROM genres g \
             JOIN media_genres mg ON mg.genre_id = g.id \
             WHERE mg.media_id = ? ORDER BY g.name",
        )
        .bind(media_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(RepositoryError::from))
            .collect()
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        media_id: Uuid,
        genres: &[String],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM media_genres WHERE media_id = ?")
            .bind(media_id.to_string())
            .execute(&mut **tx)
            .await?;

        for name in genres {
            sqlx::query("INSERT OR IGNORE INTO genres (name) VALUES (?)")
                .bind(name)
                .execute(&mut **tx)
                .await?;
            sqlx::query(
                "INSERT OR IGNORE INTO media_genres (media_id, genre_id) \
                 SELECT ?, id FROM genres WHERE name = ?",
            )
            .bind(media_id.to_string())
            .bind(name)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Upserts the series row inside an open transaction; returns the
    /// stored id.
    async fn upsert_series_tx(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        series: &Series,
    ) -> Result<Uuid, RepositoryError> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM series WHERE tmdb_id = ?")
                .bind(&series.tmdb_id)
                .fetch_optional(&mut **tx)
                .await?;

        match existing {
            Some(raw) => {
                let id = parse_uuid(&raw)?;
                sqlx::query(
                    "UPDATE series SET title = ?, overview = ?, updated_at = ? WHERE id = ?",
                )
                .bind(&series.title)
                .bind(&series.overview)
                .bind(Utc::now())
                .bind(&raw)
                .execute(&mut **tx)
                .await?;
                Ok(id)
            }
            None => {
                sqlx::query(
                    "INSERT INTO series (id, tmdb_id, title, overview, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(series.id.to_string())
                .bind(&series.tmdb_id)
                .bind(&series.title)
                .bind(&series.overview)
                .bind(series.created_at)
                .bind(series.updated_at)
                .execute(&mut **tx)
                .await?;
                Ok(series.id)
            }
        }
    }

    async fn upsert_season_tx(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        season: &Season,
        series_id: Uuid,
    ) -> Result<Uuid, RepositoryError> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM seasons WHERE tmdb_id = ?")
                .bind(&season.tmdb_id)
                .fetch_optional(&mut **tx)
                .await?;

        match existing {
            Some(raw) => {
                let id = parse_uuid(&raw)?;
                sqlx::query("UPDATE seasons SET season_number = ?, updated_at = ? WHERE id = ?")
                    .bind(season.season_number as i64)
                    .bind(Utc::now())
                    .bind(&raw)
                    .execute(&mut **tx)
                    .await?;
                Ok(id)
            }
            None => {
                sqlx::query(
                    "INSERT INTO seasons (id, series_id, tmdb_id, season_number, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(season.id.to_string())
                .bind(series_id.to_string())
                .bind(&season.tmdb_id)
                .bind(season.season_number as i64)
                .bind(season.created_at)
                .bind(season.updated_at)
                .execute(&mut **tx)
                .await?;
                Ok(season.id)
            }
        }
    }

    async fn fetch_movie_by_id(&self, id: Uuid) -> Result<Option<Movie>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM movies WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let genres = self.genres_for(id).await?;
                Ok(Some(Self::map_row_to_movie(&row, genres)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_episode_container(
        &self,
        id: Uuid,
    ) -> Result<Option<MediaContainer>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let episode = Self::map_row_to_episode(&row)?;

        let season_row = sqlx::query("SELECT * FROM seasons WHERE id = ?")
            .bind(episode.season_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                RepositoryError::Database(format!("episode {} has no season row", episode.id))
            })?;
        let season = Self::map_row_to_season(&season_row)?;

        let series_row = sqlx::query("SELECT * FROM series WHERE id = ?")
            .bind(season.series_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                RepositoryError::Database(format!("season {} has no series row", season.id))
            })?;
        let genres = self.genres_for(season.series_id).await?;
        let series = Self::map_row_to_series(&series_row, genres)?;

        Ok(Some(MediaContainer::Episode {
            episode,
            season,
            series,
        }))
    }
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, RepositoryError> {
        self.fetch_movie_by_id(id).await
    }

    async fn find_movie_by_tmdb_id(
        &self,
        tmdb_id: &str,
    ) -> Result<Option<Movie>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM movies WHERE tmdb_id = ?")
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id = parse_uuid(row.try_get("id")?)?;
                let genres = self.genres_for(id).await?;
                Ok(Some(Self::map_row_to_movie(&row, genres)?))
            }
            None => Ok(None),
        }
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM movies ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            let id = parse_uuid(row.try_get("id")?)?;
            let genres = self.genres_for(id).await?;
            movies.push(Self::map_row_to_movie(&row, genres)?);
        }
        Ok(movies)
    }

    async fn upsert_movie(&self, movie: &Movie) -> Result<Movie, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM movies WHERE tmdb_id = ?")
                .bind(&movie.tmdb_id)
                .fetch_optional(&mut *tx)
                .await?;

        let id = match existing {
            Some(raw) => {
                let id = parse_uuid(&raw)?;
                sqlx::query(
                    "UPDATE movies SET title = ?, overview = ?, release_year = ?, \
                     source_path = ?, width = ?, height = ?, duration_secs = ?, updated_at = ? \
                     WHERE id = ?",
                )
                .bind(&movie.title)
                .bind(&movie.overview)
                .bind(movie.release_year)
                .bind(&movie.source_path)
                .bind(movie.resolution.width as i64)
                .bind(movie.resolution.height as i64)
                .bind(movie.duration_secs)
                .bind(Utc::now())
                .bind(&raw)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                sqlx::query(
                    "INSERT INTO movies (id, tmdb_id, title, overview, release_year, source_path, \
                     width, height, duration_secs, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(movie.id.to_string())
                .bind(&movie.tmdb_id)
                .bind(&movie.title)
                .bind(&movie.overview)
                .bind(movie.release_year)
                .bind(&movie.source_path)
                .bind(movie.resolution.width as i64)
                .bind(movie.resolution.height as i64)
                .bind(movie.duration_secs)
                .bind(movie.created_at)
                .bind(movie.updated_at)
                .execute(&mut *tx)
                .await?;
                movie.id
            }
        };

        Self::replace_genres(&mut tx, id, &movie.genres).await?;
        tx.commit().await?;

        self.fetch_movie_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::Database("movie vanished after upsert".to_string()))
    }

    async fn find_episode(&self, id: Uuid) -> Result<Option<Episode>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::map_row_to_episode(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_episodes_by_season(
        &self,
        season_id: Uuid,
    ) -> Result<Vec<Episode>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM episodes WHERE season_id = ? ORDER BY episode_number")
                .bind(season_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(Self::map_row_to_episode).collect()
    }

    async fn upsert_episode_graph(
        &self,
        series: &Series,
        season: &Season,
        episode: &Episode,
    ) -> Result<MediaContainer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let series_id = Self::upsert_series_tx(&mut tx, series).await?;
        Self::replace_genres(&mut tx, series_id, &series.genres).await?;
        let season_id = Self::upsert_season_tx(&mut tx, season, series_id).await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM episodes WHERE tmdb_id = ?")
                .bind(&episode.tmdb_id)
                .fetch_optional(&mut *tx)
                .await?;

        let episode_id = match existing {
            Some(raw) => {
                let id = parse_uuid(&raw)?;
                sqlx::query(
                    "UPDATE episodes SET season_id = ?, episode_number = ?, title = ?, \
                     source_path = ?, width = ?, height = ?, duration_secs = ?, updated_at = ? \
                     WHERE id = ?",
                )
                .bind(season_id.to_string())
                .bind(episode.episode_number as i64)
                .bind(&episode.title)
                .bind(&episode.source_path)
                .bind(episode.resolution.width as i64)
                .bind(episode.resolution.height as i64)
                .bind(episode.duration_secs)
                .bind(Utc::now())
                .bind(&raw)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                sqlx::query(
                    "INSERT INTO episodes (id, tmdb_id, season_id, episode_number, title, \
                     source_path, width, height, duration_secs, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(episode.id.to_string())
                .bind(&episode.tmdb_id)
                .bind(season_id.to_string())
                .bind(episode.episode_number as i64)
                .bind(&episode.title)
                .bind(&episode.source_path)
                .bind(episode.resolution.width as i64)
                .bind(episode.resolution.height as i64)
                .bind(episode.duration_secs)
                .bind(episode.created_at)
                .bind(episode.updated_at)
                .execute(&mut *tx)
                .await?;
                episode.id
            }
        };

        tx.commit().await?;

        self.fetch_episode_container(episode_id)
            .await?
            .ok_or_else(|| RepositoryError::Database("episode vanished after upsert".to_string()))
    }

    async fn find_container(&self, id: Uuid) -> Result<Option<MediaContainer>, RepositoryError> {
        if let Some(movie) = self.fetch_movie_by_id(id).await? {
            return Ok(Some(MediaContainer::Movie(movie)));
        }
        self.fetch_episode_container(id).await
    }

    async fn source_path_exists(&self, path: &str) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM movies WHERE source_path = ?) + \
                    (SELECT COUNT(*) FROM episodes WHERE source_path = ?)",
        )
        .bind(path)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn delete_container(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut deleted = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            deleted = sqlx::query("DELETE FROM episodes WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        if deleted > 0 {
            sqlx::query("DELETE FROM media_genres WHERE media_id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_genres(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT name FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(RepositoryError::from))
            .collect()
    }
}
