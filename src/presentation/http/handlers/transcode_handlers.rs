//! Transcode Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::entities::permissions;
use crate::presentation::http::dto::transcode_dto::{
    EnqueueRequest, TranscodeRecordResponse, TranscodeTaskResponse,
};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/transcodes
pub async fn list_tasks(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<TranscodeTaskResponse>>, ApiError> {
    session.require(permissions::TRANSCODE_ACCESS)?;
    let tasks = state.scheduler.list();
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// GET /api/transcodes/{id}
pub async fn get_task(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<TranscodeTaskResponse>, ApiError> {
    session.require(permissions::TRANSCODE_ACCESS)?;
    let task = state
        .scheduler
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("transcode task {id}")))?;
    Ok(Json(task.into()))
}

/// POST /api/transcodes
pub async fn enqueue_task(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<EnqueueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::TRANSCODE_ACCESS)?;

    if state.store.container(request.media_id).await?.is_none() {
        return Err(ApiError::not_found(format!("media {}", request.media_id)));
    }

    let task = state
        .scheduler
        .enqueue(request.media_id, request.target_id, request.important)
        .await?;
    Ok((StatusCode::CREATED, Json(TranscodeTaskResponse::from(task))))
}

/// DELETE /api/transcodes/{id}
pub async fn cancel_task(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::TRANSCODE_ACCESS)?;
    state.scheduler.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/transcodes/history
pub async fn list_history(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<TranscodeRecordResponse>>, ApiError> {
    session.require(permissions::TRANSCODE_ACCESS)?;
    let records = state.store.transcode_records().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
