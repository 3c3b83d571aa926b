//! Store facade
//!
//! Single owner of durable entities. Every write is one repository
//! transaction, and change events are published onto the activity bus
//! strictly after the transaction commits. Components above this facade
//! never read-modify-write store state.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{
    Episode, IngestRecord, MediaContainer, Movie, Season, Series, Target, TranscodeRecord, User,
    Workflow,
};
use crate::domain::events::{MediaPersistedEvent, MediaUpdateEvent, WorkflowUpdateEvent};
use crate::domain::repositories::{
    IngestRepository, MediaRepository, SeriesRepository, TargetRepository, TranscodeRepository,
    UserRepository, WorkflowRepository,
};
use crate::domain::services::NameHints;
use crate::domain::value_objects::{ProbeReport, TitleCandidate, TitleKind};
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::interfaces::messaging::EventBus;
use crate::shared::error::{ApplicationError, RepositoryError};

pub struct StoreService {
    media: Arc<dyn MediaRepository>,
    series: Arc<dyn SeriesRepository>,
    workflows: Arc<dyn WorkflowRepository>,
    targets: Arc<dyn TargetRepository>,
    transcodes: Arc<dyn TranscodeRepository>,
    users: Arc<dyn UserRepository>,
    ingests: Arc<dyn IngestRepository>,
    event_bus: Arc<InMemoryEventBus>,
}

impl StoreService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        media: Arc<dyn MediaRepository>,
        series: Arc<dyn SeriesRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        targets: Arc<dyn TargetRepository>,
        transcodes: Arc<dyn TranscodeRepository>,
        users: Arc<dyn UserRepository>,
        ingests: Arc<dyn IngestRepository>,
        event_bus: Arc<InMemoryEventBus>,
    ) -> Self {
        Self {
            media,
            series,
            workflows,
            targets,
            transcodes,
            users,
            ingests,
            event_bus,
        }
    }

    // ===== Media =====

    /// Persists an identified watchable from the ingest pipeline.
    ///
    /// Movies upsert one row; episodes upsert series, season and episode
    /// in a single transaction. `MediaPersisted` is published only after
    /// the commit, followed by the ingest history append.
    pub async fn persist_media(
        &self,
        candidate: &TitleCandidate,
        probe: &ProbeReport,
        hints: &NameHints,
        source_path: &str,
    ) -> Result<MediaContainer, ApplicationError> {
        let container = match candidate.kind {
            TitleKind::Movie => {
                let mut movie = Movie::new(
                    candidate.tmdb_id.clone(),
                    candidate.title.clone(),
                    source_path.to_string(),
                    probe.resolution,
                )?;
                movie.overview = candidate.overview.clone();
                movie.release_year = candidate.year;
                movie.genres = candidate.genres.clone();
                movie.duration_secs = probe.duration_secs;
                MediaContainer::Movie(self.media.upsert_movie(&movie).await?)
            }
            TitleKind::Series => {
                let season_number = hints
                    .season
                    .or(probe.episodic.and_then(|e| e.season))
                    .unwrap_or(1);
                let episode_number = hints
                    .episode
                    .or(probe.episodic.and_then(|e| e.episode))
                    .unwrap_or(1);

                let mut series = Series::new(candidate.tmdb_id.clone(), candidate.title.clone());
                series.overview = candidate.overview.clone();
                series.genres = candidate.genres.clone();

                let season = Season::new(
                    series.id,
                    format!("{}-s{:02}", candidate.tmdb_id, season_number),
                    season_number,
                );

                let title = probe.title.clone().unwrap_or_else(|| {
                    format!(
                        "{} S{:02}E{:02}",
                        candidate.title, season_number, episode_number
                    )
                });
                let mut episode = Episode::new(
                    format!(
                        "{}-s{:02}e{:03}",
                        candidate.tmdb_id, season_number, episode_number
                    ),
                    season.id,
                    episode_number,
                    title,
                    source_path.to_string(),
                    probe.resolution,
                )?;
                episode.duration_secs = probe.duration_secs;

                self.media
                    .upsert_episode_graph(&series, &season, &episode)
                    .await?
            }
        };

        self.ingests
            .record(&IngestRecord::new(source_path.to_string(), container.id()))
            .await?;
        self.event_bus
            .publish(MediaPersistedEvent::new(container.id()))
            .await?;
        Ok(container)
    }

    pub async fn container(&self, id: Uuid) -> Result<Option<MediaContainer>, RepositoryError> {
        self.media.find_container(id).await
    }

    pub async fn movies(&self) -> Result<Vec<Movie>, RepositoryError> {
        self.media.list_movies().await
    }

    pub async fn movie(&self, id: Uuid) -> Result<Option<Movie>, RepositoryError> {
        self.media.find_movie(id).await
    }

    pub async fn series_list(&self) -> Result<Vec<Series>, RepositoryError> {
        self.series.list().await
    }

    pub async fn series(&self, id: Uuid) -> Result<Option<Series>, RepositoryError> {
        self.series.find(id).await
    }

    pub async fn seasons(&self, series_id: Uuid) -> Result<Vec<Season>, RepositoryError> {
        self.series.list_seasons(series_id).await
    }

    pub async fn season(&self, id: Uuid) -> Result<Option<Season>, RepositoryError> {
        self.series.find_season(id).await
    }

    pub async fn episodes(&self, season_id: Uuid) -> Result<Vec<Episode>, RepositoryError> {
        self.media.list_episodes_by_season(season_id).await
    }

    pub async fn episode(&self, id: Uuid) -> Result<Option<Episode>, RepositoryError> {
        self.media.find_episode(id).await
    }

    pub async fn genres(&self) -> Result<Vec<String>, RepositoryError> {
        self.media.list_genres().await
    }

    pub async fn source_path_exists(&self, path: &str) -> Result<bool, RepositoryError> {
        self.media.source_path_exists(path).await
    }

    /// Deletes a watchable and announces the change.
    pub async fn delete_media(&self, id: Uuid) -> Result<bool, ApplicationError> {
        let deleted = self.media.delete_container(id).await?;
        if deleted {
            self.event_bus.publish(MediaUpdateEvent::new(id)).await?;
        }
        Ok(deleted)
    }

    // ===== Workflows =====

    pub async fn workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
        self.workflows.list().await
    }

    pub async fn enabled_workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
        self.workflows.list_enabled().await
    }

    pub async fn workflow(&self, id: Uuid) -> Result<Option<Workflow>, RepositoryError> {
        self.workflows.find(id).await
    }

    pub async fn save_workflow(&self, workflow: &Workflow) -> Result<(), ApplicationError> {
        self.workflows.save(workflow).await?;
        self.event_bus
            .publish(WorkflowUpdateEvent::new(workflow.id))
            .await?;
        Ok(())
    }

    pub async fn delete_workflow(&self, id: Uuid) -> Result<bool, ApplicationError> {
        let deleted = self.workflows.delete(id).await?;
        if deleted {
            self.event_bus.publish(WorkflowUpdateEvent::new(id)).await?;
        }
        Ok(deleted)
    }

    // ===== Targets =====

    pub async fn targets(&self) -> Result<Vec<Target>, RepositoryError> {
        self.targets.list().await
    }

    pub async fn target(&self, id: Uuid) -> Result<Option<Target>, RepositoryError> {
        self.targets.find(id).await
    }

    pub async fn save_target(&self, target: &Target) -> Result<(), RepositoryError> {
        self.targets.save(target).await
    }

    pub async fn delete_target(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.targets.delete(id).await
    }

    // ===== Transcode history =====

    pub async fn record_transcode(&self, record: &TranscodeRecord) -> Result<(), RepositoryError> {
        self.transcodes.record(record).await
    }

    pub async fn transcode_records(&self) -> Result<Vec<TranscodeRecord>, RepositoryError> {
        self.transcodes.list().await
    }

    pub async fn transcode_record(
        &self,
        id: Uuid,
    ) -> Result<Option<TranscodeRecord>, RepositoryError> {
        self.transcodes.find(id).await
    }

    pub async fn transcodes_for_media(
        &self,
        media_id: Uuid,
    ) -> Result<Vec<TranscodeRecord>, RepositoryError> {
        self.transcodes.list_for_media(media_id).await
    }

    pub async fn has_completed_transcode(
        &self,
        media_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        self.transcodes.has_completed(media_id, target_id).await
    }

    // ===== Users =====

    pub async fn users(&self) -> Result<Vec<User>, RepositoryError> {
        self.users.list().await
    }

    pub async fn user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.users.find(id).await
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.users.find_by_username(username).await
    }

    pub async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        self.users.insert(user).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.users.delete(id).await
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.users.touch_last_login(id).await
    }

    // ===== Ingest history =====

    pub async fn ingest_history(&self) -> Result<Vec<IngestRecord>, RepositoryError> {
        self.ingests.list().await
    }
}
