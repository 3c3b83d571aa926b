//! Series repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Season, Series};
use crate::shared::error::RepositoryError;

/// Read seam for the episodic hierarchy. Writes go through
/// `MediaRepository::upsert_episode_graph`.
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Series>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Series>, RepositoryError>;

    async fn find_season(&self, id: Uuid) -> Result<Option<Season>, RepositoryError>;

    async fn list_seasons(&self, series_id: Uuid) -> Result<Vec<Season>, RepositoryError>;
}
