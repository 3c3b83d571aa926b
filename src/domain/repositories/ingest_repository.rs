//! Ingest history repository interface

use async_trait::async_trait;

use crate::domain::entities::IngestRecord;
use crate::shared::error::RepositoryError;

/// Write-mostly history of completed ingests.
#[async_trait]
pub trait IngestRepository: Send + Sync {
    async fn record(&self, record: &IngestRecord) -> Result<(), RepositoryError>;

    async fn list(&self) -> Result<Vec<IngestRecord>, RepositoryError>;
}
