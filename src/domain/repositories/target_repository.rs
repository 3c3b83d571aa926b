//! Target repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Target;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait TargetRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Target>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Target>, RepositoryError>;

    async fn save(&self, target: &Target) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
