//! Workflow repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Workflow;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Workflow>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Workflow>, RepositoryError>;

    async fn list_enabled(&self) -> Result<Vec<Workflow>, RepositoryError>;

    /// Insert or replace the workflow with its criteria list and target
    /// links in one transaction.
    async fn save(&self, workflow: &Workflow) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
