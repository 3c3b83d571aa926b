//! Ingest service
//!
//! Discovers files in the staging directory, holds young files until
//! their modtime settles, and drives each item through the
//! probe → search → persist pipeline on a bounded worker pool. Failures
//! never propagate: they are attached to the owning item as troubles and
//! wait for user resolution.
//!
//! The in-memory item list is guarded by one mutex held only across
//! list mutation, never during pipeline work.

use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::services::StoreService;
use crate::domain::entities::{IngestItem, IngestState, MediaContainer};
use crate::domain::events::IngestUpdateEvent;
use crate::domain::services::{parse_name_hints, NameHints};
use crate::domain::value_objects::{ProbeReport, ResolutionMethod, TitleKind, Trouble};
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::interfaces::external_services::{MetadataProber, TitleQuery, TitleSearcher};
use crate::interfaces::filesystem::DirectoryWalker;
use crate::interfaces::messaging::EventBus;
use crate::shared::error::{ApplicationError, DomainError, SearchError};

/// Ingest tuning options
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub ingest_path: PathBuf,
    /// Minimum age before a discovered file is eligible for ingestion
    pub modtime_threshold: Duration,
    /// Worker count
    pub parallelism: usize,
}

/// Payload accompanying a resolution request
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// External title id for `SpecifyTitleId`
    pub tmdb_id: Option<String>,
}

pub struct IngestService {
    options: IngestOptions,
    items: Mutex<Vec<IngestItem>>,
    wake: Notify,
    store: Arc<StoreService>,
    prober: Arc<dyn MetadataProber>,
    searcher: Arc<dyn TitleSearcher>,
    walker: Arc<dyn DirectoryWalker>,
    event_bus: Arc<InMemoryEventBus>,
    shutdown: CancellationToken,
}

impl IngestService {
    pub fn new(
        options: IngestOptions,
        store: Arc<StoreService>,
        prober: Arc<dyn MetadataProber>,
        searcher: Arc<dyn TitleSearcher>,
        walker: Arc<dyn DirectoryWalker>,
        event_bus: Arc<InMemoryEventBus>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            options,
            items: Mutex::new(Vec::new()),
            wake: Notify::new(),
            store,
            prober,
            searcher,
            walker,
            event_bus,
            shutdown,
        })
    }

    /// Spawns the worker pool.
    pub fn start(self: &Arc<Self>) {
        for worker_id in 0..self.options.parallelism.max(1) {
            let service = Arc::clone(self);
            tokio::spawn(async move {
                service.worker_loop(worker_id).await;
            });
        }
        info!(
            "Ingest service started with {} worker(s)",
            self.options.parallelism.max(1)
        );
    }

    // ===== Public contract =====

    /// Scans the ingest directory for new source files. Idempotent: a
    /// second scan over an unchanged directory produces no new items.
    pub async fn discover(self: &Arc<Self>) -> Result<(), ApplicationError> {
        let entries = self.walker.walk_files(&self.options.ingest_path).await?;
        debug!("Discovery walked {} file(s)", entries.len());

        let mut woke_any = false;
        for entry in entries {
            if self.knows_path(&entry.path) {
                continue;
            }
            if self
                .store
                .source_path_exists(&entry.path.to_string_lossy())
                .await?
            {
                continue;
            }

            let age = SystemTime::now()
                .duration_since(entry.modified)
                .unwrap_or(self.options.modtime_threshold);

            if age < self.options.modtime_threshold {
                let remaining = self.options.modtime_threshold - age;
                if let Some(id) = self.insert_item(entry.path.clone(), IngestState::ImportHold) {
                    self.publish_update(id).await;
                    self.schedule_hold_timer(id, remaining);
                }
            } else if let Some(id) = self.insert_item(entry.path.clone(), IngestState::Idle) {
                self.publish_update(id).await;
                woke_any = true;
            }
        }

        if woke_any {
            self.wake.notify_waiters();
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<IngestItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<IngestItem> {
        self.items.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }

    /// Removes an item. Rejected while a worker is ingesting it.
    pub async fn remove(&self, id: Uuid) -> Result<(), ApplicationError> {
        {
            let mut items = self.items.lock().unwrap();
            let index = items
                .iter()
                .position(|i| i.id == id)
                .ok_or_else(|| DomainError::NotFound(format!("ingest item {id}")))?;
            if items[index].state == IngestState::Ingesting {
                return Err(DomainError::Precondition(
                    "cannot remove an item while it is ingesting".to_string(),
                )
                .into());
            }
            items.remove(index);
        }
        self.publish_update(id).await;
        Ok(())
    }

    /// Applies a user resolution to a troubled item.
    pub async fn resolve(
        &self,
        id: Uuid,
        method: ResolutionMethod,
        context: ResolveContext,
    ) -> Result<(), ApplicationError> {
        let (path, probed) = {
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| DomainError::NotFound(format!("ingest item {id}")))?;

            let trouble = item.trouble.as_ref().ok_or_else(|| {
                DomainError::Precondition("item has no trouble to resolve".to_string())
            })?;
            if !trouble.allows(method) {
                return Err(DomainError::Precondition(format!(
                    "resolution {} not allowed for {}",
                    method,
                    trouble.kind()
                ))
                .into());
            }
            if method == ResolutionMethod::SpecifyTitleId && context.tmdb_id.is_none() {
                return Err(DomainError::InvalidInput(
                    "specify_title_id requires a title id".to_string(),
                )
                .into());
            }

            match method {
                ResolutionMethod::Retry => {
                    item.trouble = None;
                    item.state = IngestState::Idle;
                    (item.source_path.clone(), None)
                }
                ResolutionMethod::Abort => {
                    let index = items.iter().position(|i| i.id == id).unwrap();
                    items.remove(index);
                    (PathBuf::new(), None)
                }
                ResolutionMethod::SpecifyTitleId => {
                    // This call acts as the item's worker from here on
                    item.trouble = None;
                    item.state = IngestState::Ingesting;
                    (item.source_path.clone(), item.probed.clone())
                }
            }
        };

        self.publish_update(id).await;

        match method {
            ResolutionMethod::Retry => {
                self.wake.notify_waiters();
                Ok(())
            }
            ResolutionMethod::Abort => Ok(()),
            ResolutionMethod::SpecifyTitleId => {
                let Some(tmdb_id) = context.tmdb_id else {
                    return Err(DomainError::InvalidInput(
                        "specify_title_id requires a title id".to_string(),
                    )
                    .into());
                };
                match self.ingest_with_title_id(&path, &tmdb_id, probed).await {
                    Ok(_) => {
                        self.delete_item(id);
                        self.publish_update(id).await;
                        Ok(())
                    }
                    Err(trouble) => {
                        self.attach_trouble(id, trouble);
                        self.publish_update(id).await;
                        Ok(())
                    }
                }
            }
        }
    }

    // ===== Worker pool =====

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        debug!("Ingest worker {} up", worker_id);
        loop {
            let notified = self.wake.notified();

            if self.shutdown.is_cancelled() {
                break;
            }

            if let Some((id, path)) = self.claim_idle() {
                self.publish_update(id).await;
                self.process_claimed(id, &path).await;
                continue;
            }

            tokio::select! {
                _ = notified => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        debug!("Ingest worker {} drained", worker_id);
    }

    /// Claims one Idle item by CAS-ing it to Ingesting under the lock.
    fn claim_idle(&self) -> Option<(Uuid, PathBuf)> {
        let mut items = self.items.lock().unwrap();
        let item = items.iter_mut().find(|i| i.state == IngestState::Idle)?;
        item.state = IngestState::Ingesting;
        Some((item.id, item.source_path.clone()))
    }

    async fn process_claimed(self: &Arc<Self>, id: Uuid, path: &Path) {
        let service = Arc::clone(self);
        let path_buf = path.to_path_buf();
        let outcome = std::panic::AssertUnwindSafe(service.run_pipeline(id, path_buf))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "pipeline panicked".to_string());
                error!("Ingest pipeline panicked for item {}: {}", id, message);
                Err(Trouble::Unknown { message })
            }
        };

        match result {
            Ok(media) => {
                info!("Ingested {:?} as media {}", path, media.id());
                self.delete_item(id);
                self.publish_update(id).await;
            }
            Err(trouble) => {
                warn!(
                    "Ingest item {} troubled ({}): {}",
                    id,
                    trouble.kind(),
                    trouble.message()
                );
                self.attach_trouble(id, trouble);
                self.publish_update(id).await;
            }
        }
    }

    // ===== Per-item pipeline =====

    async fn run_pipeline(
        self: Arc<Self>,
        id: Uuid,
        path: PathBuf,
    ) -> Result<MediaContainer, Trouble> {
        // Probe
        let report = self.prober.probe(&path).await.map_err(|e| {
            Trouble::MetadataFailure {
                message: e.to_string(),
            }
        })?;
        self.set_probed(id, report.clone());

        // Search
        let hints = parse_name_hints(&path);
        let query = Self::build_query(&hints, &report);
        let candidates = self
            .searcher
            .search(&query)
            .await
            .map_err(Self::search_trouble)?;

        let candidate = match candidates.len() {
            0 => {
                return Err(Trouble::SearchNoResult {
                    message: format!("no title matched {:?}", query.title),
                })
            }
            1 => candidates.into_iter().next().unwrap(),
            n => {
                return Err(Trouble::SearchMultipleResults {
                    message: format!("{n} titles matched {:?}", query.title),
                    candidates,
                })
            }
        };

        // Persist
        self.store
            .persist_media(&candidate, &report, &hints, &path.to_string_lossy())
            .await
            .map_err(|e| Trouble::Unknown {
                message: e.to_string(),
            })
    }

    /// Persist path for a user-specified title id; skips the search.
    async fn ingest_with_title_id(
        &self,
        path: &Path,
        tmdb_id: &str,
        probed: Option<ProbeReport>,
    ) -> Result<MediaContainer, Trouble> {
        let report = match probed {
            Some(report) => report,
            None => self.prober.probe(path).await.map_err(|e| {
                Trouble::MetadataFailure {
                    message: e.to_string(),
                }
            })?,
        };

        let candidate = match self.searcher.fetch(tmdb_id).await {
            Ok(candidate) => candidate,
            // A bad id must stay resolvable with a corrected one
            Err(SearchError::NotFound(_)) => {
                return Err(Trouble::SearchNoResult {
                    message: format!("no title record for {tmdb_id}"),
                })
            }
            Err(e) => return Err(Self::search_trouble(e)),
        };

        let hints = parse_name_hints(path);
        self.store
            .persist_media(&candidate, &report, &hints, &path.to_string_lossy())
            .await
            .map_err(|e| Trouble::Unknown {
                message: e.to_string(),
            })
    }

    fn build_query(hints: &NameHints, report: &ProbeReport) -> TitleQuery {
        let episodic = hints.season.is_some()
            || hints.episode.is_some()
            || report.episodic.is_some();
        TitleQuery {
            title: hints.title.clone(),
            year: hints.year,
            kind: if episodic {
                TitleKind::Series
            } else {
                TitleKind::Movie
            },
        }
    }

    fn search_trouble(error: SearchError) -> Trouble {
        if error.is_transport() {
            Trouble::SearchTransport {
                message: error.to_string(),
            }
        } else {
            Trouble::Unknown {
                message: error.to_string(),
            }
        }
    }

    // ===== Hold timer =====

    fn schedule_hold_timer(self: &Arc<Self>, id: Uuid, delay: Duration) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = service.shutdown.cancelled() => return,
            }
            service.check_hold(id).await;
        });
    }

    async fn check_hold(self: &Arc<Self>, id: Uuid) {
        let path = match self.get(id) {
            Some(item) if item.state == IngestState::ImportHold => item.source_path,
            // Removed or already promoted
            _ => return,
        };

        let modified = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified().ok(),
            Err(_) => None,
        };

        let Some(modified) = modified else {
            debug!("Held file {:?} vanished; dropping item", path);
            self.delete_item(id);
            self.publish_update(id).await;
            return;
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(self.options.modtime_threshold);

        if age < self.options.modtime_threshold {
            // Still being written; try again once the remainder elapses
            self.schedule_hold_timer(id, self.options.modtime_threshold - age);
            return;
        }

        {
            let mut items = self.items.lock().unwrap();
            if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                if item.state == IngestState::ImportHold {
                    item.state = IngestState::Idle;
                }
            }
        }
        self.publish_update(id).await;
        self.wake.notify_waiters();
    }

    // ===== Item bookkeeping =====

    fn knows_path(&self, path: &Path) -> bool {
        self.items
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.source_path == path)
    }

    /// Inserts a new item unless the path appeared concurrently.
    fn insert_item(&self, path: PathBuf, state: IngestState) -> Option<Uuid> {
        let mut items = self.items.lock().unwrap();
        if items.iter().any(|i| i.source_path == path) {
            return None;
        }
        let item = IngestItem::new(path, state);
        let id = item.id;
        items.push(item);
        Some(id)
    }

    fn delete_item(&self, id: Uuid) {
        let mut items = self.items.lock().unwrap();
        items.retain(|i| i.id != id);
    }

    fn attach_trouble(&self, id: Uuid, trouble: Trouble) {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.trouble = Some(trouble);
            item.state = IngestState::Troubled;
        }
    }

    fn set_probed(&self, id: Uuid, report: ProbeReport) {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.probed = Some(report);
        }
    }

    async fn publish_update(&self, id: Uuid) {
        if let Err(e) = self.event_bus.publish(IngestUpdateEvent::new(id)).await {
            warn!("Failed to publish ingest update: {}", e);
        }
    }
}
