//! User repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::User;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Record a successful login timestamp.
    async fn touch_last_login(&self, id: Uuid) -> Result<(), RepositoryError>;
}
