//! Target Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{permissions, Target};
use crate::presentation::http::dto::target_dto::{SaveTargetRequest, TargetResponse};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/targets
pub async fn list_targets(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<TargetResponse>>, ApiError> {
    session.require(permissions::SETTINGS_MANAGE)?;
    let targets = state.store.targets().await?;
    Ok(Json(targets.into_iter().map(Into::into).collect()))
}

/// GET /api/targets/{id}
pub async fn get_target(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<TargetResponse>, ApiError> {
    session.require(permissions::SETTINGS_MANAGE)?;
    let target = state
        .store
        .target(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("target {id}")))?;
    Ok(Json(target.into()))
}

/// POST /api/targets
pub async fn create_target(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<SaveTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::SETTINGS_MANAGE)?;
    if request.label.trim().is_empty() {
        return Err(ApiError::bad_request("label cannot be empty"));
    }
    if request.threads == 0 {
        return Err(ApiError::bad_request("threads must be at least 1"));
    }

    let target = Target::new(request.label, request.options, request.threads);
    state.store.save_target(&target).await?;
    Ok((StatusCode::CREATED, Json(TargetResponse::from(target))))
}

/// PUT /api/targets/{id}
pub async fn update_target(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveTargetRequest>,
) -> Result<Json<TargetResponse>, ApiError> {
    session.require(permissions::SETTINGS_MANAGE)?;
    if request.threads == 0 {
        return Err(ApiError::bad_request("threads must be at least 1"));
    }

    let mut target = state
        .store
        .target(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("target {id}")))?;

    target.label = request.label;
    target.options = request.options;
    target.threads = request.threads;
    target.updated_at = Utc::now();

    state.store.save_target(&target).await?;
    Ok(Json(target.into()))
}

/// DELETE /api/targets/{id}
pub async fn delete_target(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::SETTINGS_MANAGE)?;
    if !state.store.delete_target(id).await? {
        return Err(ApiError::not_found(format!("target {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
