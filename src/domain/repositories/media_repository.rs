//! Media repository interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Episode, MediaContainer, Movie, Season, Series};
use crate::shared::error::RepositoryError;

/// Persistence seam for watchable media (movies and episodes).
///
/// Upserts are keyed on the external title-database id: re-persisting the
/// same tmdb id updates the existing row and keeps its id stable.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, RepositoryError>;

    async fn find_movie_by_tmdb_id(&self, tmdb_id: &str)
        -> Result<Option<Movie>, RepositoryError>;

    async fn list_movies(&self) -> Result<Vec<Movie>, RepositoryError>;

    /// Insert or update a movie row keyed by tmdb id, together with its
    /// genre links, in one transaction. Returns the stored row.
    async fn upsert_movie(&self, movie: &Movie) -> Result<Movie, RepositoryError>;

    async fn find_episode(&self, id: Uuid) -> Result<Option<Episode>, RepositoryError>;

    async fn list_episodes_by_season(
        &self,
        season_id: Uuid,
    ) -> Result<Vec<Episode>, RepositoryError>;

    /// Upsert series, season and episode in one transaction, keyed by
    /// their tmdb ids. Returns the stored graph as a container.
    async fn upsert_episode_graph(
        &self,
        series: &Series,
        season: &Season,
        episode: &Episode,
    ) -> Result<MediaContainer, RepositoryError>;

    /// Resolve a watchable id (movie or episode) to its container.
    async fn find_container(&self, id: Uuid) -> Result<Option<MediaContainer>, RepositoryError>;

    /// True if any watchable already claims this source path.
    async fn source_path_exists(&self, path: &str) -> Result<bool, RepositoryError>;

    /// Delete a watchable by id. Returns false when nothing matched.
    async fn delete_container(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// All known genre names.
    async fn list_genres(&self) -> Result<Vec<String>, RepositoryError>;
}
