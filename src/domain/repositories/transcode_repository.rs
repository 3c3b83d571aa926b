//! Transcode history repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::TranscodeRecord;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait TranscodeRepository: Send + Sync {
    /// Append a terminal outcome.
    async fn record(&self, record: &TranscodeRecord) -> Result<(), RepositoryError>;

    async fn find(&self, id: Uuid) -> Result<Option<TranscodeRecord>, RepositoryError>;

    async fn list(&self) -> Result<Vec<TranscodeRecord>, RepositoryError>;

    async fn list_for_media(&self, media_id: Uuid)
        -> Result<Vec<TranscodeRecord>, RepositoryError>;

    /// True if a completed artifact exists for the pair; used by the
    /// workflow matcher to skip already-satisfied targets.
    async fn has_completed(
        &self,
        media_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepositoryError>;
}
