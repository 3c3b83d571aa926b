//! Session Handlers
//!
//! Login, logout, logout-all and the current-user view.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::domain::events::UserTokensRevokedEvent;
use crate::infrastructure::auth::password;
use crate::interfaces::messaging::EventBus;
use crate::presentation::http::dto::user_dto::{LoginRequest, UserResponse};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::auth::{
    clearing_cookies, session_cookies, AuthSession, REFRESH_COOKIE,
};
use crate::presentation::http::state::AppState;

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .user_by_username(&request.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    if !password::verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let pair = state.tokens.issue_pair(&user)?;

    // Login timestamp is recorded off the request path
    {
        let store = state.store.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = store.touch_last_login(user_id).await {
                warn!("Failed to record login timestamp: {}", e);
            }
        });
    }

    let (access, refresh) = session_cookies(&pair);
    Ok((
        jar.add(access).add(refresh),
        Json(UserResponse::from(user)),
    ))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state.tokens.revocation().revoke_token(&session.claims.jti);

    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        if let Ok(refresh) = state.tokens.verify_refresh(cookie.value()) {
            state.tokens.revocation().revoke_token(&refresh.jti);
        }
    }

    let (access, refresh) = clearing_cookies();
    Ok((jar.add(access).add(refresh), StatusCode::NO_CONTENT))
}

/// POST /api/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state.tokens.revoke_all_for(session.user_id);

    if let Err(e) = state
        .event_bus
        .publish(UserTokensRevokedEvent::new(session.user_id))
        .await
    {
        warn!("Failed to publish token revocation: {}", e);
    }

    let (access, refresh) = clearing_cookies();
    Ok((jar.add(access).add(refresh), StatusCode::NO_CONTENT))
}

/// GET /api/current-user
pub async fn current_user(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .user(session.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user no longer exists"))?;
    Ok(Json(user.into()))
}
