//! SQLite Transcode History Repository Implementation

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::media_repository::parse_uuid;
use crate::domain::entities::TranscodeRecord;
use crate::domain::repositories::TranscodeRepository;
use crate::shared::error::RepositoryError;

pub struct SqliteTranscodeRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTranscodeRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TranscodeRecord, RepositoryError> {
        Ok(TranscodeRecord {
            id: parse_uuid(row.try_get("id")?)?,
            media_id: parse_uuid(row.try_get("media_id")?)?,
            target_id: parse_uuid(row.try_get("target_id")?)?,
            state: row.try_get("state")?,
            output_path: row.try_get("output_path")?,
            failure_reason: row.try_get("failure_reason")?,
            finished_at: row.try_get("finished_at")?,
        })
    }
}

#[async_trait]
impl TranscodeRepository for SqliteTranscodeRepository {
    async fn record(&self, record: &TranscodeRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO transcodes (id, media_id, target_id, state, output_path, \
             failure_reason, finished_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.media_id.to_string())
        .bind(record.target_id.to_string())
        .bind(&record.state)
        .bind(&record.output_path)
        .bind(&record.failure_reason)
        .bind(record.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<TranscodeRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM transcodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::map_row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<TranscodeRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM transcodes ORDER BY finished_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::map_row_to_record).collect()
    }

    async fn list_for_media(
        &self,
        media_id: Uuid,
    ) -> Result<Vec<TranscodeRecord>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM transcodes WHERE media_id = ? ORDER BY finished_at DESC")
                .bind(media_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(Self::map_row_to_record).collect()
    }

    async fn has_completed(
        &self,
        media_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transcodes \
             WHERE media_id = ? AND target_id = ? AND state = 'completed'",
        )
        .bind(media_id.to_string())
        .bind(target_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}
