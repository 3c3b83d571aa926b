//! SQLite Target Repository Implementation
//!
//! The option bundle is opaque to the store and kept as JSON.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::media_repository::parse_uuid;
use crate::domain::entities::{RunnerOption, Target};
use crate::domain::repositories::TargetRepository;
use crate::shared::error::RepositoryError;

pub struct SqliteTargetRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTargetRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_row_to_target(row: &sqlx::sqlite::SqliteRow) -> Result<Target, RepositoryError> {
        let options: Vec<RunnerOption> = serde_json::from_str(row.try_get("options")?)?;
        Ok(Target {
            id: parse_uuid(row.try_get("id")?)?,
            label: row.try_get("label")?,
            options,
            threads: row.try_get::<i64, _>("threads")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TargetRepository for SqliteTargetRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Target>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM targets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::map_row_to_target(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Target>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM targets ORDER BY label")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::map_row_to_target).collect()
    }

    async fn save(&self, target: &Target) -> Result<(), RepositoryError> {
        let options = serde_json::to_string(&target.options)?;
        sqlx::query(
            "INSERT INTO targets (id, label, options, threads, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET label = excluded.label, \
             options = excluded.options, threads = excluded.threads, \
             updated_at = excluded.updated_at",
        )
        .bind(target.id.to_string())
        .bind(&target.label)
        .bind(options)
        .bind(target.threads as i64)
        .bind(target.created_at)
        .bind(target.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM targets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
