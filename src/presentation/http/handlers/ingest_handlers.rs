//! Ingest Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::application::ResolveContext;
use crate::domain::entities::permissions;
use crate::presentation::http::dto::ingest_dto::{IngestItemResponse, ResolveRequest};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/ingests
pub async fn list_ingests(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<IngestItemResponse>>, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    let items = state
        .ingest
        .list()
        .into_iter()
        .map(IngestItemResponse::from)
        .collect();
    Ok(Json(items))
}

/// GET /api/ingests/{id}
pub async fn get_ingest(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<IngestItemResponse>, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    let item = state
        .ingest
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("ingest item {id}")))?;
    Ok(Json(item.into()))
}

/// GET /api/ingests/history
pub async fn list_history(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<crate::domain::entities::IngestRecord>>, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    Ok(Json(state.store.ingest_history().await?))
}

/// POST /api/ingests/discover
pub async fn discover(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    state.ingest.discover().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/ingests/{id}
pub async fn remove_ingest(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    state.ingest.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/ingests/{id}/resolve
pub async fn resolve_ingest(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::INGEST_ACCESS)?;
    let context = ResolveContext {
        tmdb_id: request.tmdb_id,
    };
    state.ingest.resolve(id, request.method, context).await?;
    Ok(StatusCode::NO_CONTENT)
}
