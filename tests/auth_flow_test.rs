//! Integration tests for the session and permission gate
//!
//! Drives the real router: login issues the cookie pair, gated routes
//! verify it, the permission gate returns 403, and logout-all revokes
//! every earlier token for that user only.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

use common::*;
use mediamill::application::{
    IngestOptions, IngestService, StoreService, TranscodeOptions, TranscodeService,
};
use mediamill::domain::entities::{permissions, User};
use mediamill::infrastructure::auth::{password, RevocationStore, TokenService};
use mediamill::infrastructure::filesystem::WalkDirAdapter;
use mediamill::presentation::http::handlers::{auth_handlers, user_handlers};
use mediamill::presentation::http::middleware::auth;
use mediamill::presentation::http::AppState;
use mediamill::presentation::ws::WsHub;
use mediamill::shared::config::AuthConfig;

async fn build_app() -> (Router, Arc<StoreService>) {
    let (store, bus) = test_store().await;

    let auth_config = AuthConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_lifetime_secs: 3600,
        refresh_lifetime_secs: 86_400,
        auto_refresh_threshold_secs: 900,
    };
    let tokens = Arc::new(TokenService::new(
        &auth_config,
        Arc::new(RevocationStore::new()),
    ));

    let shutdown = CancellationToken::new();
    let scheduler = TranscodeService::new(
        TranscodeOptions {
            pool_size: 2,
            output_dir: std::env::temp_dir().join("mediamill-test-out"),
            tick: Duration::from_millis(500),
        },
        store.clone(),
        Arc::new(InstantRunner),
        bus.clone(),
        shutdown.clone(),
    );

    let ingest = IngestService::new(
        IngestOptions {
            ingest_path: std::env::temp_dir(),
            modtime_threshold: Duration::from_secs(60),
            parallelism: 1,
        },
        store.clone(),
        Arc::new(StubProber {
            report: probe_report(1920, 1080, 100.0),
        }),
        Arc::new(StubSearcher::with_candidates(Vec::new())),
        Arc::new(WalkDirAdapter::new()),
        bus.clone(),
        shutdown,
    );

    let state = AppState {
        store: store.clone(),
        ingest,
        scheduler,
        tokens,
        event_bus: bus,
        ws_hub: Arc::new(WsHub::new()),
    };

    let protected = Router::new()
        .route("/api/logout", post(auth_handlers::logout))
        .route("/api/logout-all", post(auth_handlers::logout_all))
        .route("/api/current-user", get(auth_handlers::current_user))
        .route("/api/users", get(user_handlers::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let app = Router::new()
        .route("/api/login", post(auth_handlers::login))
        .merge(protected)
        .with_state(state);

    (app, store)
}

async fn seed_user(store: &Arc<StoreService>, username: &str, perms: Vec<String>) {
    let hash = password::hash_password("correct horse").unwrap();
    let user = User::new(username.to_string(), hash, perms);
    store.create_user(&user).await.unwrap();
}

/// Logs in and returns the Cookie header value for subsequent requests.
async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Option<String>) {
    let body = serde_json::json!({ "username": username, "password": password }).to_string();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(|v| v.to_string())
        .collect();

    let cookie_header = if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    };
    (status, cookie_header)
}

async fn get_with_cookies(app: &Router, uri: &str, cookies: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

async fn post_with_cookies(app: &Router, uri: &str, cookies: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn login_issues_cookies_and_gates_open() {
    let (app, store) = build_app().await;
    seed_user(&store, "alice", vec![permissions::MEDIA_ACCESS.to_string()]).await;

    let (status, cookies) = login(&app, "alice", "correct horse").await;
    assert_eq!(status, StatusCode::OK);
    let cookies = cookies.expect("login set no cookies");
    assert!(cookies.contains("mediamill_access"));
    assert!(cookies.contains("mediamill_refresh"));

    let status = get_with_cookies(&app, "/api/current-user", Some(&cookies)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, store) = build_app().await;
    seed_user(&store, "alice", Vec::new()).await;

    let (status, _) = login(&app, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _store) = build_app().await;
    let status = get_with_cookies(&app, "/api/current-user", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn permission_gate_returns_forbidden_without_the_tag() {
    let (app, store) = build_app().await;
    seed_user(&store, "viewer", vec![permissions::MEDIA_ACCESS.to_string()]).await;
    seed_user(&store, "root", vec![permissions::USER_ADMIN.to_string()]).await;

    let (_, viewer_cookies) = login(&app, "viewer", "correct horse").await;
    let status = get_with_cookies(&app, "/api/users", viewer_cookies.as_deref()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, root_cookies) = login(&app, "root", "correct horse").await;
    let status = get_with_cookies(&app, "/api/users", root_cookies.as_deref()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_blacklists_the_presented_tokens() {
    let (app, store) = build_app().await;
    seed_user(&store, "alice", Vec::new()).await;

    let (_, cookies) = login(&app, "alice", "correct horse").await;
    let cookies = cookies.unwrap();

    assert_eq!(
        post_with_cookies(&app, "/api/logout", &cookies).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        get_with_cookies(&app, "/api/current-user", Some(&cookies)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn logout_all_revokes_earlier_sessions_for_that_user_only() {
    let (app, store) = build_app().await;
    seed_user(&store, "u", Vec::new()).await;
    seed_user(&store, "v", Vec::new()).await;

    let (_, a1) = login(&app, "u", "correct horse").await;
    let (_, a2) = login(&app, "u", "correct horse").await;
    let (_, a3) = login(&app, "u", "correct horse").await;
    let (_, b1) = login(&app, "v", "correct horse").await;
    let a1 = a1.unwrap();
    let a2 = a2.unwrap();
    let a3 = a3.unwrap();
    let b1 = b1.unwrap();

    // The watermark has one-second resolution; make sure the earlier
    // tokens fall strictly behind it
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(
        post_with_cookies(&app, "/api/logout-all", &a3).await,
        StatusCode::NO_CONTENT
    );

    for cookies in [&a1, &a2, &a3] {
        assert_eq!(
            get_with_cookies(&app, "/api/current-user", Some(cookies)).await,
            StatusCode::UNAUTHORIZED
        );
    }
    assert_eq!(
        get_with_cookies(&app, "/api/current-user", Some(&b1)).await,
        StatusCode::OK
    );

    // A fresh login works; the stale sessions stay dead
    let (status, a4) = login(&app, "u", "correct horse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        get_with_cookies(&app, "/api/current-user", a4.as_deref()).await,
        StatusCode::OK
    );
    assert_eq!(
        get_with_cookies(&app, "/api/current-user", Some(&a1)).await,
        StatusCode::UNAUTHORIZED
    );
}
