//! Shared fixtures for the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use mediamill::application::StoreService;
use mediamill::domain::value_objects::{
    ProbeReport, ProgressSample, Resolution, TitleCandidate, TitleKind,
};
use mediamill::infrastructure::database::{create_pool, initialize_schema};
use mediamill::infrastructure::messaging::InMemoryEventBus;
use mediamill::infrastructure::persistence::sqlite::{
    SqliteIngestRepository, SqliteMediaRepository, SqliteSeriesRepository, SqliteTargetRepository,
    SqliteTranscodeRepository, SqliteUserRepository, SqliteWorkflowRepository,
};
use mediamill::interfaces::external_services::{
    MetadataProber, RunnerJob, TitleQuery, TitleSearcher, TranscodeRunner,
};
use mediamill::shared::error::{ProbeError, RunnerError, SearchError};

/// In-memory store wired to a fresh schema.
pub async fn test_store() -> (Arc<StoreService>, Arc<InMemoryEventBus>) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    initialize_schema(&pool).await.unwrap();

    let event_bus = Arc::new(InMemoryEventBus::new());
    let store = Arc::new(StoreService::new(
        Arc::new(SqliteMediaRepository::new(pool.clone())),
        Arc::new(SqliteSeriesRepository::new(pool.clone())),
        Arc::new(SqliteWorkflowRepository::new(pool.clone())),
        Arc::new(SqliteTargetRepository::new(pool.clone())),
        Arc::new(SqliteTranscodeRepository::new(pool.clone())),
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqliteIngestRepository::new(pool)),
        event_bus.clone(),
    ));
    (store, event_bus)
}

pub fn probe_report(width: u32, height: u32, duration_secs: f64) -> ProbeReport {
    ProbeReport {
        title: None,
        duration_secs: Some(duration_secs),
        resolution: Resolution::new(width, height),
        container: Some("matroska".to_string()),
        episodic: None,
    }
}

pub fn movie_candidate(tmdb_id: &str, title: &str, year: i32) -> TitleCandidate {
    TitleCandidate {
        tmdb_id: tmdb_id.to_string(),
        kind: TitleKind::Movie,
        title: title.to_string(),
        year: Some(year),
        overview: None,
        genres: Vec::new(),
    }
}

/// Prober returning a fixed report.
pub struct StubProber {
    pub report: ProbeReport,
}

#[async_trait]
impl MetadataProber for StubProber {
    async fn probe(&self, _path: &Path) -> Result<ProbeReport, ProbeError> {
        Ok(self.report.clone())
    }
}

/// Prober that always fails to parse.
pub struct FailingProber;

#[async_trait]
impl MetadataProber for FailingProber {
    async fn probe(&self, _path: &Path) -> Result<ProbeReport, ProbeError> {
        Err(ProbeError::ParseError("malformed container".to_string()))
    }
}

/// Searcher returning a fixed candidate list.
pub struct StubSearcher {
    pub candidates: Vec<TitleCandidate>,
    pub fetch_result: Option<TitleCandidate>,
    pub fail_transport: bool,
}

impl StubSearcher {
    pub fn with_candidates(candidates: Vec<TitleCandidate>) -> Self {
        Self {
            candidates,
            fetch_result: None,
            fail_transport: false,
        }
    }

    pub fn transport_failure() -> Self {
        Self {
            candidates: Vec::new(),
            fetch_result: None,
            fail_transport: true,
        }
    }
}

#[async_trait]
impl TitleSearcher for StubSearcher {
    async fn search(&self, _query: &TitleQuery) -> Result<Vec<TitleCandidate>, SearchError> {
        if self.fail_transport {
            return Err(SearchError::Network("connection refused".to_string()));
        }
        Ok(self.candidates.clone())
    }

    async fn fetch(&self, tmdb_id: &str) -> Result<TitleCandidate, SearchError> {
        self.fetch_result
            .clone()
            .ok_or_else(|| SearchError::NotFound(tmdb_id.to_string()))
    }
}

/// Runner held open until a release permit arrives; useful for budget
/// and cancellation scenarios. Permits are stored, so releasing before
/// the runner starts waiting still lets exactly one run finish.
/// Cancellation is acknowledged promptly.
pub struct ManualRunner {
    permits: Arc<Semaphore>,
    emit_progress: bool,
}

impl ManualRunner {
    pub fn new() -> (Arc<Self>, Arc<Semaphore>) {
        Self::build(false)
    }

    pub fn with_progress() -> (Arc<Self>, Arc<Semaphore>) {
        Self::build(true)
    }

    fn build(emit_progress: bool) -> (Arc<Self>, Arc<Semaphore>) {
        let permits = Arc::new(Semaphore::new(0));
        (
            Arc::new(Self {
                permits: permits.clone(),
                emit_progress,
            }),
            permits,
        )
    }
}

#[async_trait]
impl TranscodeRunner for ManualRunner {
    async fn run(
        &self,
        _job: RunnerJob,
        progress: mpsc::Sender<ProgressSample>,
        cancel: CancellationToken,
    ) -> Result<(), RunnerError> {
        if self.emit_progress {
            let _ = progress.try_send(ProgressSample {
                percent: Some(1.0),
                speed: Some(1.0),
                bitrate_kbps: None,
                elapsed_secs: 0.5,
            });
        }
        tokio::select! {
            permit = self.permits.acquire() => {
                permit.expect("release semaphore closed").forget();
                Ok(())
            }
            _ = cancel.cancelled() => Err(RunnerError::Cancelled),
        }
    }
}

/// Runner that completes instantly.
pub struct InstantRunner;

#[async_trait]
impl TranscodeRunner for InstantRunner {
    async fn run(
        &self,
        _job: RunnerJob,
        _progress: mpsc::Sender<ProgressSample>,
        _cancel: CancellationToken,
    ) -> Result<(), RunnerError> {
        Ok(())
    }
}

/// Runner that fails with a fixed diagnostic.
pub struct FailingRunner {
    pub reason: String,
}

#[async_trait]
impl TranscodeRunner for FailingRunner {
    async fn run(
        &self,
        _job: RunnerJob,
        _progress: mpsc::Sender<ProgressSample>,
        _cancel: CancellationToken,
    ) -> Result<(), RunnerError> {
        Err(RunnerError::Failed(self.reason.clone()))
    }
}
