//! Integration tests for the ingest pipeline
//!
//! Exercises discovery, the modtime hold, the probe → search → persist
//! pipeline and trouble resolution against an in-memory store with stub
//! external tools.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::*;
use mediamill::application::{IngestOptions, IngestService, ResolveContext, StoreService};
use mediamill::domain::entities::IngestState;
use mediamill::domain::events::MediaPersistedEvent;
use mediamill::domain::value_objects::ResolutionMethod;
use mediamill::infrastructure::filesystem::WalkDirAdapter;
use mediamill::infrastructure::messaging::InMemoryEventBus;
use mediamill::interfaces::external_services::{MetadataProber, TitleSearcher};
use mediamill::interfaces::messaging::EventBus;

fn build_service(
    store: Arc<StoreService>,
    bus: Arc<InMemoryEventBus>,
    prober: Arc<dyn MetadataProber>,
    searcher: Arc<dyn TitleSearcher>,
    ingest_path: PathBuf,
    threshold: Duration,
) -> Arc<IngestService> {
    IngestService::new(
        IngestOptions {
            ingest_path,
            modtime_threshold: threshold,
            parallelism: 2,
        },
        store,
        prober,
        searcher,
        Arc::new(WalkDirAdapter::new()),
        bus,
        CancellationToken::new(),
    )
}

/// Polls until the condition holds or the deadline passes.
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
async fn happy_path_movie_lands_in_store() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Shaun.of.the.Dead.2004.mkv");
    std::fs::write(&file, b"video").unwrap();

    let (store, bus) = test_store().await;
    let mut persisted_rx = bus.subscribe_channel::<MediaPersistedEvent>(8).await;

    let prober = Arc::new(StubProber {
        report: probe_report(1280, 760, 5924.0),
    });
    let searcher = Arc::new(StubSearcher::with_candidates(vec![movie_candidate(
        "tt0365748",
        "Shaun of the Dead",
        2004,
    )]));

    let service = build_service(
        store.clone(),
        bus,
        prober,
        searcher,
        dir.path().to_path_buf(),
        Duration::ZERO,
    );
    service.start();
    service.discover().await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.list().is_empty()).await;

    let movies = store.movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].tmdb_id, "tt0365748");
    assert_eq!(movies[0].title, "Shaun of the Dead");
    assert_eq!(movies[0].resolution.to_string(), "1280x760");

    let event = tokio::time::timeout(Duration::from_secs(1), persisted_rx.recv())
        .await
        .expect("MediaPersisted not published")
        .unwrap();
    assert_eq!(event.media_id, movies[0].id);
}

#[tokio::test]
async fn discover_twice_produces_no_new_items() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.mkv"), b"x").unwrap();
    std::fs::write(dir.path().join("b.mkv"), b"y").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let searcher = Arc::new(StubSearcher::with_candidates(Vec::new()));

    // Workers never started: items stay Idle
    let service = build_service(
        store,
        bus,
        prober,
        searcher,
        dir.path().to_path_buf(),
        Duration::ZERO,
    );

    service.discover().await.unwrap();
    assert_eq!(service.list().len(), 2);

    service.discover().await.unwrap();
    assert_eq!(service.list().len(), 2);
}

#[tokio::test]
async fn discovery_skips_paths_already_in_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Known.Movie.2010.mkv");
    std::fs::write(&file, b"video").unwrap();

    let (store, bus) = test_store().await;
    let hints = mediamill::domain::services::parse_name_hints(&file);
    store
        .persist_media(
            &movie_candidate("tt0000001", "Known Movie", 2010),
            &probe_report(1920, 1080, 100.0),
            &hints,
            &file.to_string_lossy(),
        )
        .await
        .unwrap();

    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let searcher = Arc::new(StubSearcher::with_candidates(Vec::new()));
    let service = build_service(
        store,
        bus,
        prober,
        searcher,
        dir.path().to_path_buf(),
        Duration::ZERO,
    );

    service.discover().await.unwrap();
    assert!(service.list().is_empty());
}

#[tokio::test]
async fn young_file_is_held_then_promoted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fresh.mkv"), b"x").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let searcher = Arc::new(StubSearcher::with_candidates(Vec::new()));

    // File was modified moments ago, so it starts in the hold
    let service = build_service(
        store,
        bus,
        prober,
        searcher,
        dir.path().to_path_buf(),
        Duration::from_millis(500),
    );
    service.discover().await.unwrap();

    let items = service.list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].state, IngestState::ImportHold);

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.state == IngestState::Idle)
            .unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn vanished_held_file_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("ghost.mkv");
    std::fs::write(&file, b"x").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let searcher = Arc::new(StubSearcher::with_candidates(Vec::new()));
    let service = build_service(
        store,
        bus,
        prober,
        searcher,
        dir.path().to_path_buf(),
        Duration::from_millis(300),
    );

    service.discover().await.unwrap();
    assert_eq!(service.list().len(), 1);

    std::fs::remove_file(&file).unwrap();
    let service_for_wait = service.clone();
    wait_for(move || service_for_wait.list().is_empty()).await;
}

#[tokio::test]
async fn multi_result_search_troubles_and_specify_title_resolves() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Ambiguous.Movie.1994.mkv"), b"x").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let mut searcher = StubSearcher::with_candidates(vec![
        movie_candidate("tt0111161", "Ambiguous Movie", 1994),
        movie_candidate("tt0111162", "Ambiguous Movie II", 1994),
    ]);
    searcher.fetch_result = Some(movie_candidate("tt0111161", "Ambiguous Movie", 1994));

    let service = build_service(
        store.clone(),
        bus,
        prober,
        Arc::new(searcher),
        dir.path().to_path_buf(),
        Duration::ZERO,
    );
    service.start();
    service.discover().await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.state == IngestState::Troubled)
            .unwrap_or(false)
    })
    .await;

    let item = service.list().into_iter().next().unwrap();
    let trouble = item.trouble.as_ref().unwrap();
    assert_eq!(trouble.kind(), "search_multiple_results");
    assert!(trouble.allows(ResolutionMethod::SpecifyTitleId));

    service
        .resolve(
            item.id,
            ResolutionMethod::SpecifyTitleId,
            ResolveContext {
                tmdb_id: Some("tt0111161".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(service.list().is_empty());
    let movies = store.movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].tmdb_id, "tt0111161");
}

#[tokio::test]
async fn transport_failure_retry_returns_to_troubled_with_same_identity() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Flaky.Movie.2001.mkv"), b"x").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let service = build_service(
        store,
        bus,
        prober,
        Arc::new(StubSearcher::transport_failure()),
        dir.path().to_path_buf(),
        Duration::ZERO,
    );
    service.start();
    service.discover().await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.state == IngestState::Troubled)
            .unwrap_or(false)
    })
    .await;

    let item = service.list().into_iter().next().unwrap();
    assert_eq!(item.trouble.as_ref().unwrap().kind(), "search_transport");

    service
        .resolve(item.id, ResolutionMethod::Retry, ResolveContext::default())
        .await
        .unwrap();

    // The searcher still fails, so the item re-troubles under its
    // original identity
    let service_for_wait = service.clone();
    let original_id = item.id;
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.id == original_id && i.state == IngestState::Troubled)
            .unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn metadata_failure_rejects_specify_title_resolution() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.mkv"), b"x").unwrap();

    let (store, bus) = test_store().await;
    let service = build_service(
        store,
        bus,
        Arc::new(FailingProber),
        Arc::new(StubSearcher::with_candidates(Vec::new())),
        dir.path().to_path_buf(),
        Duration::ZERO,
    );
    service.start();
    service.discover().await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.state == IngestState::Troubled)
            .unwrap_or(false)
    })
    .await;

    let item = service.list().into_iter().next().unwrap();
    assert_eq!(item.trouble.as_ref().unwrap().kind(), "metadata_failure");

    let rejected = service
        .resolve(
            item.id,
            ResolutionMethod::SpecifyTitleId,
            ResolveContext {
                tmdb_id: Some("tt0000001".to_string()),
            },
        )
        .await;
    assert!(rejected.is_err());
}

#[tokio::test]
async fn abort_removes_item_without_persisting() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Unmatched.Movie.2020.mkv"), b"x").unwrap();

    let (store, bus) = test_store().await;
    let prober = Arc::new(StubProber {
        report: probe_report(1920, 1080, 100.0),
    });
    let service = build_service(
        store.clone(),
        bus,
        prober,
        Arc::new(StubSearcher::with_candidates(Vec::new())),
        dir.path().to_path_buf(),
        Duration::ZERO,
    );
    service.start();
    service.discover().await.unwrap();

    let service_for_wait = service.clone();
    wait_for(move || {
        service_for_wait
            .list()
            .first()
            .map(|i| i.state == IngestState::Troubled)
            .unwrap_or(false)
    })
    .await;

    let item = service.list().into_iter().next().unwrap();
    assert_eq!(item.trouble.as_ref().unwrap().kind(), "search_no_result");

    service
        .resolve(item.id, ResolutionMethod::Abort, ResolveContext::default())
        .await
        .unwrap();

    assert!(service.list().is_empty());
    assert!(store.movies().await.unwrap().is_empty());
}
