//! Transcode scheduler
//!
//! Bounded worker over the pool thread budget. Admission runs every
//! tick and on wake: waiting tasks are admitted FIFO while the budget
//! holds, and a waiting important task reserves the pool by blocking
//! every non-important admission until it has run. The task list and the
//! thread counter live behind one mutex held only for admission passes
//! and completion bookkeeping.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::services::StoreService;
use crate::domain::entities::{TranscodeRecord, TranscodeTask};
use crate::domain::events::{TranscodeTaskProgressUpdateEvent, TranscodeTaskUpdateEvent};
use crate::domain::value_objects::TaskState;
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::interfaces::external_services::{RunnerJob, TranscodeRunner};
use crate::interfaces::messaging::EventBus;
use crate::shared::error::{ApplicationError, DomainError, RunnerError};

/// Minimum interval between progress broadcasts per task
const PROGRESS_BROADCAST_INTERVAL: Duration = Duration::from_millis(500);

/// Scheduler tuning options
#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    /// Pool thread budget gating concurrent work
    pub pool_size: u32,
    /// Root for transcoded outputs
    pub output_dir: PathBuf,
    /// Admission cadence
    pub tick: Duration,
}

#[derive(Debug, Default)]
struct SchedulerState {
    /// FIFO by enqueue order; retained after termination for history
    tasks: Vec<TranscodeTask>,
    used_threads: u32,
}

pub struct TranscodeService {
    options: TranscodeOptions,
    state: Mutex<SchedulerState>,
    cancel_handles: Mutex<HashMap<Uuid, CancellationToken>>,
    wake: Notify,
    store: Arc<StoreService>,
    runner: Arc<dyn TranscodeRunner>,
    event_bus: Arc<InMemoryEventBus>,
    shutdown: CancellationToken,
}

impl TranscodeService {
    pub fn new(
        options: TranscodeOptions,
        store: Arc<StoreService>,
        runner: Arc<dyn TranscodeRunner>,
        event_bus: Arc<InMemoryEventBus>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            options,
            state: Mutex::new(SchedulerState::default()),
            cancel_handles: Mutex::new(HashMap::new()),
            wake: Notify::new(),
            store,
            runner,
            event_bus,
            shutdown,
        })
    }

    /// Spawns the admission loop.
    pub fn start(self: &Arc<Self>) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(service.options.tick);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = tick.tick() => {}
                    _ = service.wake.notified() => {}
                    _ = service.shutdown.cancelled() => break,
                }
                service.admission_pass().await;
            }
            debug!("Transcode admission loop stopped");
        });
        info!(
            "Transcode scheduler started with a budget of {} thread(s)",
            self.options.pool_size
        );
    }

    // ===== Public contract =====

    /// Creates a task in `Waiting`.
    ///
    /// Rejected when the target's thread requirement can never fit the
    /// budget, or when the (media, target) pair already has an active
    /// task.
    pub async fn enqueue(
        &self,
        media_id: Uuid,
        target_id: Uuid,
        important: bool,
    ) -> Result<TranscodeTask, ApplicationError> {
        let target = self
            .store
            .target(target_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("target {target_id}")))?;

        let threads = target.threads.max(1);
        if threads > self.options.pool_size {
            return Err(DomainError::Precondition(format!(
                "target requires {} threads but the pool budget is {}",
                threads, self.options.pool_size
            ))
            .into());
        }

        let task = {
            let mut state = self.state.lock().unwrap();
            let duplicate = state
                .tasks
                .iter()
                .any(|t| t.media_id == media_id && t.target_id == target_id && t.state.is_active());
            if duplicate {
                return Err(DomainError::Precondition(
                    "an active task already exists for this media and target".to_string(),
                )
                .into());
            }

            let task = TranscodeTask::new(media_id, target_id, threads, important);
            state.tasks.push(task.clone());
            task
        };

        self.publish_task_update(task.id).await;
        self.wake.notify_one();
        Ok(task)
    }

    /// Requests cancellation. Always accepted for known tasks: waiting
    /// tasks terminate immediately, running tasks once the runner
    /// acknowledges.
    pub async fn cancel(&self, task_id: Uuid) -> Result<(), ApplicationError> {
        enum Action {
            Done(TranscodeTask),
            Signal,
            Noop,
        }

        let action = {
            let mut state = self.state.lock().unwrap();
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| DomainError::NotFound(format!("transcode task {task_id}")))?;

            match task.state {
                TaskState::Waiting => {
                    task.state = TaskState::Cancelled;
                    Action::Done(task.clone())
                }
                TaskState::Running => Action::Signal,
                _ => Action::Noop,
            }
        };

        match action {
            Action::Done(task) => {
                self.record_terminal(&task).await;
                self.publish_task_update(task.id).await;
            }
            Action::Signal => {
                let handle = self.cancel_handles.lock().unwrap().get(&task_id).cloned();
                if let Some(token) = handle {
                    token.cancel();
                }
            }
            Action::Noop => {}
        }
        Ok(())
    }

    /// Cancels every active task for a media id.
    pub async fn cancel_for_media(&self, media_id: Uuid) -> Result<(), ApplicationError> {
        let ids: Vec<Uuid> = {
            let state = self.state.lock().unwrap();
            state
                .tasks
                .iter()
                .filter(|t| t.media_id == media_id && t.state.is_active())
                .map(|t| t.id)
                .collect()
        };
        for id in ids {
            self.cancel(id).await?;
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<TranscodeTask> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<TranscodeTask> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn active_for_media(&self, media_id: Uuid) -> Vec<TranscodeTask> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.media_id == media_id && t.state.is_active())
            .cloned()
            .collect()
    }

    pub fn active_for_media_and_target(
        &self,
        media_id: Uuid,
        target_id: Uuid,
    ) -> Option<TranscodeTask> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.media_id == media_id && t.target_id == target_id && t.state.is_active())
            .cloned()
    }

    /// Threads currently admitted against the budget.
    pub fn used_threads(&self) -> u32 {
        self.state.lock().unwrap().used_threads
    }

    // ===== Admission =====

    async fn admission_pass(self: &Arc<Self>) {
        let launches: Vec<(TranscodeTask, CancellationToken)> = {
            let mut state = self.state.lock().unwrap();
            let important_waiting = state
                .tasks
                .iter()
                .any(|t| t.important && t.state == TaskState::Waiting);

            let pool_size = self.options.pool_size;
            let mut used = state.used_threads;
            let mut launches = Vec::new();

            for task in state.tasks.iter_mut() {
                if task.state != TaskState::Waiting {
                    continue;
                }
                // A waiting important task reserves the pool
                if important_waiting && !task.important {
                    continue;
                }
                if used + task.threads <= pool_size {
                    task.state = TaskState::Running;
                    used += task.threads;
                    // The cancel handle must exist before the task is
                    // observable as Running
                    let token = self.shutdown.child_token();
                    self.cancel_handles
                        .lock()
                        .unwrap()
                        .insert(task.id, token.clone());
                    launches.push((task.clone(), token));
                }
            }
            state.used_threads = used;
            launches
        };

        for (task, token) in launches {
            self.publish_task_update(task.id).await;
            let service = Arc::clone(self);
            tokio::spawn(async move {
                service.execute(task, token).await;
            });
        }
    }

    // ===== Execution =====

    async fn execute(self: Arc<Self>, task: TranscodeTask, token: CancellationToken) {
        let container = match self.store.container(task.media_id).await {
            Ok(Some(container)) => container,
            Ok(None) => {
                self.finish(task.id, TaskState::Failed {
                    reason: "media no longer exists".to_string(),
                })
                .await;
                return;
            }
            Err(e) => {
                self.finish(task.id, TaskState::Failed {
                    reason: e.to_string(),
                })
                .await;
                return;
            }
        };

        let target = match self.store.target(task.target_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                self.finish(task.id, TaskState::Failed {
                    reason: "target no longer exists".to_string(),
                })
                .await;
                return;
            }
            Err(e) => {
                self.finish(task.id, TaskState::Failed {
                    reason: e.to_string(),
                })
                .await;
                return;
            }
        };

        let output = self
            .options
            .output_dir
            .join(task.media_id.to_string())
            .join(format!("{}.mkv", target.id));

        let job = RunnerJob {
            input: PathBuf::from(container.source_path()),
            output: output.clone(),
            options: target.options.clone(),
            duration_hint_secs: container.duration_secs(),
        };

        let (tx, rx) = mpsc::channel(32);
        let progress_consumer = {
            let service = Arc::clone(&self);
            let task_id = task.id;
            tokio::spawn(async move {
                service.consume_progress(task_id, rx).await;
            })
        };

        let result = self.runner.run(job, tx, token).await;

        // The runner dropped its sender; wait for the consumer so the
        // terminal update is the last event for this task id
        let _ = progress_consumer.await;

        let final_state = match result {
            Ok(()) => TaskState::Completed {
                output_path: output,
            },
            Err(RunnerError::Cancelled) => TaskState::Cancelled,
            Err(RunnerError::Failed(reason)) => TaskState::Failed { reason },
            Err(RunnerError::Startup(e)) => TaskState::Failed {
                reason: format!("runner startup failed: {e}"),
            },
            Err(RunnerError::Io(e)) => TaskState::Failed {
                reason: e.to_string(),
            },
        };

        self.finish(task.id, final_state).await;
    }

    async fn consume_progress(
        &self,
        task_id: Uuid,
        mut rx: mpsc::Receiver<crate::domain::value_objects::ProgressSample>,
    ) {
        let mut last_broadcast: Option<Instant> = None;
        while let Some(sample) = rx.recv().await {
            {
                let mut state = self.state.lock().unwrap();
                if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
                    task.last_progress = Some(sample);
                }
            }

            let due = last_broadcast
                .map(|at| at.elapsed() >= PROGRESS_BROADCAST_INTERVAL)
                .unwrap_or(true);
            if due {
                last_broadcast = Some(Instant::now());
                if let Err(e) = self
                    .event_bus
                    .publish(TranscodeTaskProgressUpdateEvent::new(task_id, sample))
                    .await
                {
                    warn!("Failed to publish progress update: {}", e);
                }
            }
        }
    }

    /// Terminal bookkeeping: state transition, budget release, history
    /// row, terminal update, admission wake.
    async fn finish(&self, task_id: Uuid, final_state: TaskState) {
        let finished = {
            let mut state = self.state.lock().unwrap();
            let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) else {
                error!("Finished task {} missing from the list", task_id);
                return;
            };
            task.state = final_state;
            let snapshot = task.clone();
            state.used_threads = state.used_threads.saturating_sub(snapshot.threads);
            snapshot
        };

        self.cancel_handles.lock().unwrap().remove(&task_id);

        match &finished.state {
            TaskState::Completed { output_path } => {
                info!(
                    "Transcode {} completed: {:?}",
                    finished.id, output_path
                );
            }
            TaskState::Failed { reason } => {
                warn!("Transcode {} failed: {}", finished.id, reason);
            }
            TaskState::Cancelled => {
                info!("Transcode {} cancelled", finished.id);
            }
            _ => {}
        }

        self.record_terminal(&finished).await;
        self.publish_task_update(task_id).await;
        self.wake.notify_one();
    }

    async fn record_terminal(&self, task: &TranscodeTask) {
        let (output_path, failure_reason) = match &task.state {
            TaskState::Completed { output_path } => {
                (Some(output_path.to_string_lossy().to_string()), None)
            }
            TaskState::Failed { reason } => (None, Some(reason.clone())),
            _ => (None, None),
        };

        let record = TranscodeRecord {
            id: task.id,
            media_id: task.media_id,
            target_id: task.target_id,
            state: task.state.as_str().to_string(),
            output_path,
            failure_reason,
            finished_at: chrono::Utc::now(),
        };

        if let Err(e) = self.store.record_transcode(&record).await {
            error!("Failed to record transcode outcome: {}", e);
        }
    }

    async fn publish_task_update(&self, task_id: Uuid) {
        if let Err(e) = self
            .event_bus
            .publish(TranscodeTaskUpdateEvent::new(task_id))
            .await
        {
            warn!("Failed to publish task update: {}", e);
        }
    }
}
