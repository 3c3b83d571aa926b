//! Integration tests for the transcode scheduler
//!
//! Admission against the thread budget, the important-task reservation,
//! cancellation semantics and completion persistence, driven with
//! controllable stub runners.

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::*;
use mediamill::application::{StoreService, TranscodeOptions, TranscodeService};
use mediamill::domain::entities::Target;
use mediamill::domain::services::parse_name_hints;
use mediamill::domain::value_objects::TaskState;
use mediamill::infrastructure::messaging::InMemoryEventBus;
use mediamill::interfaces::external_services::TranscodeRunner;

async fn seed_movie(store: &Arc<StoreService>, tmdb_id: &str) -> Uuid {
    let path = format!("/library/{tmdb_id}.mkv");
    let container = store
        .persist_media(
            &movie_candidate(tmdb_id, "Some Movie", 2004),
            &probe_report(1920, 1080, 600.0),
            &parse_name_hints(std::path::Path::new(&path)),
            &path,
        )
        .await
        .unwrap();
    container.id()
}

async fn seed_target(store: &Arc<StoreService>, label: &str, threads: u32) -> Uuid {
    let target = Target::new(label.to_string(), Vec::new(), threads);
    store.save_target(&target).await.unwrap();
    target.id
}

fn scheduler(
    store: Arc<StoreService>,
    bus: Arc<InMemoryEventBus>,
    runner: Arc<dyn TranscodeRunner>,
    pool_size: u32,
) -> Arc<TranscodeService> {
    let service = TranscodeService::new(
        TranscodeOptions {
            pool_size,
            output_dir: std::env::temp_dir().join("mediamill-test-out"),
            tick: Duration::from_millis(50),
        },
        store,
        runner,
        bus,
        CancellationToken::new(),
    );
    service.start();
    service
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within deadline");
}

#[tokio::test]
async fn task_runs_to_completion_and_is_recorded() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000010").await;
    let target = seed_target(&store, "1080p", 1).await;

    let service = scheduler(store.clone(), bus, Arc::new(InstantRunner), 2);
    let task = service.enqueue(media, target, false).await.unwrap();
    assert_eq!(task.state, TaskState::Waiting);

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .get(task.id)
            .map(|t| matches!(t.state, TaskState::Completed { .. }))
            .unwrap_or(false)
    })
    .await;

    assert_eq!(service.used_threads(), 0);
    assert!(store.has_completed_transcode(media, target).await.unwrap());
}

#[tokio::test]
async fn thread_requirement_beyond_budget_is_rejected_at_enqueue() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000011").await;
    let target = seed_target(&store, "everything", 8).await;

    let service = scheduler(store, bus, Arc::new(InstantRunner), 4);
    let rejected = service.enqueue(media, target, false).await;
    assert!(rejected.is_err());
    assert!(service.list().is_empty());
}

#[tokio::test]
async fn second_active_task_for_pair_is_rejected() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000012").await;
    let target = seed_target(&store, "1080p", 1).await;

    let (runner, _release) = ManualRunner::new();
    let service = scheduler(store, bus, runner, 2);

    service.enqueue(media, target, false).await.unwrap();
    assert!(service.enqueue(media, target, false).await.is_err());
}

#[tokio::test]
async fn admission_respects_the_thread_budget() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000013").await;
    let t1 = seed_target(&store, "a", 1).await;
    let t2 = seed_target(&store, "b", 1).await;
    let t3 = seed_target(&store, "c", 1).await;

    let (runner, release) = ManualRunner::new();
    let service = scheduler(store, bus, runner, 2);

    service.enqueue(media, t1, false).await.unwrap();
    service.enqueue(media, t2, false).await.unwrap();
    service.enqueue(media, t3, false).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.used_threads() == 2).await;

    let running = service
        .list()
        .into_iter()
        .filter(|t| t.state == TaskState::Running)
        .count();
    let waiting = service
        .list()
        .into_iter()
        .filter(|t| t.state == TaskState::Waiting)
        .count();
    assert_eq!(running, 2);
    assert_eq!(waiting, 1);

    // Let the admitted pair finish; the third takes its slot
    release.add_permits(2);
    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .filter(|t| matches!(t.state, TaskState::Completed { .. }))
            .count()
            == 2
    })
    .await;

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .any(|t| t.state == TaskState::Running)
    })
    .await;

    release.add_permits(1);
    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .all(|t| matches!(t.state, TaskState::Completed { .. }))
    })
    .await;
    assert_eq!(service.used_threads(), 0);
}

#[tokio::test]
async fn waiting_important_task_blocks_other_admissions() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000014").await;
    let small = seed_target(&store, "small", 1).await;
    let big = seed_target(&store, "big", 2).await;
    let other = seed_target(&store, "other", 1).await;

    let (runner, release) = ManualRunner::new();
    let service = scheduler(store, bus, runner, 2);

    // Occupy one thread
    service.enqueue(media, small, false).await.unwrap();
    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.used_threads() == 1).await;

    // Needs the whole pool; must wait for the drain
    let important = service.enqueue(media, big, true).await.unwrap();
    // Would fit, but the waiting important task reserves the pool
    let starved = service.enqueue(media, other, false).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(service.get(important.id).unwrap().state, TaskState::Waiting);
    assert_eq!(service.get(starved.id).unwrap().state, TaskState::Waiting);

    // Drain the running task; the important one launches alone
    release.add_permits(1);
    let service_for_wait = service.clone();
    let important_id = important.id;
    wait_for(move || {
        service_for_wait
            .get(important_id)
            .map(|t| t.state == TaskState::Running)
            .unwrap_or(false)
    })
    .await;
    assert_eq!(service.get(starved.id).unwrap().state, TaskState::Waiting);

    release.add_permits(1);
    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .filter(|t| matches!(t.state, TaskState::Completed { .. }))
            .count()
            == 2
    })
    .await;

    // With the reservation gone the starved task finally runs
    release.add_permits(1);
    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .all(|t| matches!(t.state, TaskState::Completed { .. }))
    })
    .await;
}

#[tokio::test]
async fn cancel_for_media_cancels_running_tasks_and_frees_the_budget() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000015").await;
    let t1 = seed_target(&store, "a", 1).await;
    let t2 = seed_target(&store, "b", 1).await;

    let (runner, _release) = ManualRunner::new();
    let service = scheduler(store.clone(), bus, runner, 4);

    service.enqueue(media, t1, false).await.unwrap();
    service.enqueue(media, t2, false).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.used_threads() == 2).await;

    service.cancel_for_media(media).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .iter()
            .all(|t| t.state == TaskState::Cancelled)
    })
    .await;
    assert_eq!(service.used_threads(), 0);

    // No completion was ever recorded for either pair
    assert!(!store.has_completed_transcode(media, t1).await.unwrap());
    assert!(!store.has_completed_transcode(media, t2).await.unwrap());
    let records = store.transcodes_for_media(media).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.state == "cancelled"));
}

#[tokio::test]
async fn cancelling_a_waiting_task_terminates_it_immediately() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000016").await;
    let t1 = seed_target(&store, "a", 1).await;
    let t2 = seed_target(&store, "b", 1).await;

    let (runner, _release) = ManualRunner::new();
    let service = scheduler(store, bus, runner, 1);

    service.enqueue(media, t1, false).await.unwrap();
    let waiting = service.enqueue(media, t2, false).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.used_threads() == 1).await;

    service.cancel(waiting.id).await.unwrap();
    assert_eq!(service.get(waiting.id).unwrap().state, TaskState::Cancelled);
}

#[tokio::test]
async fn failed_runner_surfaces_the_diagnostic() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000017").await;
    let target = seed_target(&store, "a", 1).await;

    let service = scheduler(
        store.clone(),
        bus,
        Arc::new(FailingRunner {
            reason: "unsupported pixel format".to_string(),
        }),
        2,
    );
    let task = service.enqueue(media, target, false).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .get(task.id)
            .map(|t| matches!(t.state, TaskState::Failed { .. }))
            .unwrap_or(false)
    })
    .await;

    match service.get(task.id).unwrap().state {
        TaskState::Failed { reason } => assert_eq!(reason, "unsupported pixel format"),
        other => panic!("unexpected state {other:?}"),
    }

    let records = store.transcodes_for_media(media).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].failure_reason.as_deref(),
        Some("unsupported pixel format")
    );
}

#[tokio::test]
async fn progress_samples_land_on_the_task() {
    let (store, bus) = test_store().await;
    let media = seed_movie(&store, "tt0000018").await;
    let target = seed_target(&store, "a", 1).await;

    let (runner, release) = ManualRunner::with_progress();
    let service = scheduler(store, bus, runner, 2);
    let task = service.enqueue(media, target, false).await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .get(task.id)
            .map(|t| t.last_progress.is_some())
            .unwrap_or(false)
    })
    .await;

    release.add_permits(1);
    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .get(task.id)
            .map(|t| matches!(t.state, TaskState::Completed { .. }))
            .unwrap_or(false)
    })
    .await;
}
