mod application;
mod domain;
mod infrastructure;
mod interfaces;
mod presentation;
mod shared;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::handlers::MediaPersistedHandler;
use crate::application::{
    IngestOptions, IngestService, StoreService, TranscodeOptions, TranscodeService,
};
use crate::domain::entities::{permissions, User};
use crate::infrastructure::auth::{RevocationStore, TokenService};
use crate::infrastructure::database::{create_pool, initialize_schema};
use crate::infrastructure::external::{FfmpegRunner, FfprobeAdapter, TmdbClient};
use crate::infrastructure::filesystem::WalkDirAdapter;
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::infrastructure::persistence::sqlite::{
    SqliteIngestRepository, SqliteMediaRepository, SqliteSeriesRepository, SqliteTargetRepository,
    SqliteTranscodeRepository, SqliteUserRepository, SqliteWorkflowRepository,
};
use crate::infrastructure::auth::password;
use crate::domain::events::MediaPersistedEvent;
use crate::interfaces::messaging::{EventBus, EventHandler};
use crate::presentation::http::handlers::{
    auth_handlers, health_handlers, ingest_handlers, media_handlers, target_handlers,
    transcode_handlers, user_handlers, workflow_handlers,
};
use crate::presentation::http::middleware::{auth, cors, logging};
use crate::presentation::http::AppState;
use crate::presentation::ws::{handler as ws_handler, RealtimeBroadcaster, WsHub};
use crate::shared::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    config.validate()?;
    info!(
        "Starting mediamill: ingest={:?}, budget={} thread(s)",
        config.ingest_path, config.thread_pool_size
    );

    if config.services.enable_embedded_db || config.services.enable_embedded_db_admin {
        // Container supervision is an external collaborator; the server
        // only records the operator's intent
        info!(
            "Auxiliary service toggles: embedded_db={}, embedded_db_admin={}",
            config.services.enable_embedded_db, config.services.enable_embedded_db_admin
        );
    }

    // Store
    let pool = create_pool(&config.database.url).await?;
    initialize_schema(&pool).await?;

    let event_bus = Arc::new(InMemoryEventBus::new());
    let store = Arc::new(StoreService::new(
        Arc::new(SqliteMediaRepository::new(pool.clone())),
        Arc::new(SqliteSeriesRepository::new(pool.clone())),
        Arc::new(SqliteWorkflowRepository::new(pool.clone())),
        Arc::new(SqliteTargetRepository::new(pool.clone())),
        Arc::new(SqliteTranscodeRepository::new(pool.clone())),
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqliteIngestRepository::new(pool.clone())),
        event_bus.clone(),
    ));

    bootstrap_admin(&store).await?;

    // Session gate
    let revocation = Arc::new(RevocationStore::new());
    let tokens = Arc::new(TokenService::new(&config.auth, revocation));

    // Service lifetimes follow this token
    let shutdown = CancellationToken::new();

    // Transcode scheduler
    let runner = Arc::new(FfmpegRunner::new(config.format.runner_path.clone()));
    let scheduler = TranscodeService::new(
        TranscodeOptions {
            pool_size: config.thread_pool_size,
            output_dir: config.format.output_dir.clone(),
            tick: Duration::from_secs(2),
        },
        store.clone(),
        runner,
        event_bus.clone(),
        shutdown.clone(),
    );
    scheduler.start();

    // Ingest pipeline
    let prober = Arc::new(FfprobeAdapter::new(
        config.format.prober_path.clone(),
        Duration::from_secs(30),
    ));
    let searcher = Arc::new(TmdbClient::new(&config.tmdb_api_key)?);
    let ingest = IngestService::new(
        IngestOptions {
            ingest_path: config.ingest_path.clone(),
            modtime_threshold: Duration::from_secs(config.modtime_threshold_seconds),
            parallelism: config.ingestion_parallelism,
        },
        store.clone(),
        prober,
        searcher,
        Arc::new(WalkDirAdapter::new()),
        event_bus.clone(),
        shutdown.clone(),
    );
    ingest.start();

    // Workflow matcher
    let matcher: Arc<dyn EventHandler<MediaPersistedEvent>> =
        Arc::new(MediaPersistedHandler::new(store.clone(), scheduler.clone()));
    event_bus.subscribe(matcher).await?;

    // Realtime
    let ws_hub = Arc::new(WsHub::new());
    RealtimeBroadcaster::new(ws_hub.clone(), event_bus.clone(), shutdown.clone())
        .start()
        .await;

    // Initial scan plus the periodic force sync
    {
        let ingest = ingest.clone();
        let cadence = config.force_sync_seconds;
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = ingest.discover().await {
                warn!("Initial discovery failed: {}", e);
            }
            if cadence == 0 {
                return;
            }
            let mut tick = tokio::time::interval(Duration::from_secs(cadence));
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        if let Err(e) = ingest.discover().await {
                            warn!("Periodic discovery failed: {}", e);
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
        });
    }

    let state = AppState {
        store,
        ingest,
        scheduler,
        tokens,
        event_bus,
        ws_hub,
    };

    // Routes behind the session gate
    let protected = Router::new()
        .route("/api/logout", post(auth_handlers::logout))
        .route("/api/logout-all", post(auth_handlers::logout_all))
        .route("/api/current-user", get(auth_handlers::current_user))
        .route("/api/ingests", get(ingest_handlers::list_ingests))
        .route("/api/ingests/history", get(ingest_handlers::list_history))
        .route("/api/ingests/discover", post(ingest_handlers::discover))
        .route(
            "/api/ingests/:id",
            get(ingest_handlers::get_ingest).delete(ingest_handlers::remove_ingest),
        )
        .route("/api/ingests/:id/resolve", post(ingest_handlers::resolve_ingest))
        .route("/api/media/:id", get(media_handlers::get_media).delete(media_handlers::delete_media))
        .route(
            "/api/media/:id/watch-targets",
            get(media_handlers::get_watch_targets),
        )
        .route("/api/movies", get(media_handlers::list_movies))
        .route("/api/movies/:id", get(media_handlers::get_movie))
        .route("/api/series", get(media_handlers::list_series))
        .route("/api/series/:id", get(media_handlers::get_series))
        .route("/api/series/:id/seasons", get(media_handlers::list_seasons))
        .route("/api/seasons/:id/episodes", get(media_handlers::list_episodes))
        .route("/api/episodes/:id", get(media_handlers::get_episode))
        .route("/api/genres", get(media_handlers::list_genres))
        .route(
            "/api/workflows",
            get(workflow_handlers::list_workflows).post(workflow_handlers::create_workflow),
        )
        .route(
            "/api/workflows/:id",
            get(workflow_handlers::get_workflow)
                .put(workflow_handlers::update_workflow)
                .delete(workflow_handlers::delete_workflow),
        )
        .route(
            "/api/targets",
            get(target_handlers::list_targets).post(target_handlers::create_target),
        )
        .route(
            "/api/targets/:id",
            get(target_handlers::get_target)
                .put(target_handlers::update_target)
                .delete(target_handlers::delete_target),
        )
        .route(
            "/api/transcodes",
            get(transcode_handlers::list_tasks).post(transcode_handlers::enqueue_task),
        )
        .route("/api/transcodes/history", get(transcode_handlers::list_history))
        .route(
            "/api/transcodes/:id",
            get(transcode_handlers::get_task).delete(transcode_handlers::cancel_task),
        )
        .route(
            "/api/users",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route(
            "/api/users/:id",
            get(user_handlers::get_user).delete(user_handlers::delete_user),
        )
        .route("/api/activity/ws", get(ws_handler::ws_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_handlers::health_check))
        .route("/api/login", post(auth_handlers::login))
        .merge(protected)
        .layer(axum::middleware::from_fn(logging::logging_middleware))
        .layer(cors::cors_layer())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested; draining workers");
            serve_shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Creates the bootstrap administrator on a fresh store.
async fn bootstrap_admin(store: &Arc<StoreService>) -> anyhow::Result<()> {
    if !store.users().await?.is_empty() {
        return Ok(());
    }

    let password = std::env::var("MEDIAMILL_ADMIN_PASSWORD").unwrap_or_else(|_| {
        warn!("MEDIAMILL_ADMIN_PASSWORD not set; using the default bootstrap password");
        "mediamill".to_string()
    });

    let user = User::new(
        "admin".to_string(),
        password::hash_password(&password)
            .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {e}"))?,
        permissions::ALL.iter().map(|p| p.to_string()).collect(),
    );
    store.create_user(&user).await?;
    info!("Bootstrap administrator created (username: admin)");
    Ok(())
}
