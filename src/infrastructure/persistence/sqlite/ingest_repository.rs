//! SQLite Ingest History Repository Implementation

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use super::media_repository::parse_uuid;
use crate::domain::entities::IngestRecord;
use crate::domain::repositories::IngestRepository;
use crate::shared::error::RepositoryError;

pub struct SqliteIngestRepository {
    pool: Pool<Sqlite>,
}

impl SqliteIngestRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngestRepository for SqliteIngestRepository {
    async fn record(&self, record: &IngestRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO ingests (id, source_path, media_id, completed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.source_path)
        .bind(record.media_id.to_string())
        .bind(record.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<IngestRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM ingests ORDER BY completed_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(IngestRecord {
                    id: parse_uuid(row.try_get("id")?)?,
                    source_path: row.try_get("source_path")?,
                    media_id: parse_uuid(row.try_get("media_id")?)?,
                    completed_at: row.try_get("completed_at")?,
                })
            })
            .collect()
    }
}
