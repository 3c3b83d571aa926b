//! Workflow Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{permissions, Workflow};
use crate::presentation::http::dto::workflow_dto::{SaveWorkflowRequest, WorkflowResponse};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<WorkflowResponse>>, ApiError> {
    session.require(permissions::WORKFLOW_ACCESS)?;
    let workflows = state.store.workflows().await?;
    Ok(Json(workflows.into_iter().map(Into::into).collect()))
}

/// GET /api/workflows/{id}
pub async fn get_workflow(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    session.require(permissions::WORKFLOW_ACCESS)?;
    let workflow = state
        .store
        .workflow(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("workflow {id}")))?;
    Ok(Json(workflow.into()))
}

/// POST /api/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<SaveWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::WORKFLOW_ACCESS)?;
    validate_label(&request.label)?;
    validate_targets(&state, &request.target_ids).await?;

    let workflow = Workflow::new(
        request.label,
        request.enabled,
        request.criteria.into_iter().map(Into::into).collect(),
        request.target_ids,
    );
    state.store.save_workflow(&workflow).await?;
    Ok((StatusCode::CREATED, Json(WorkflowResponse::from(workflow))))
}

/// PUT /api/workflows/{id}
pub async fn update_workflow(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveWorkflowRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    session.require(permissions::WORKFLOW_ACCESS)?;
    validate_label(&request.label)?;
    validate_targets(&state, &request.target_ids).await?;

    let mut workflow = state
        .store
        .workflow(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("workflow {id}")))?;

    workflow.label = request.label;
    workflow.enabled = request.enabled;
    workflow.criteria = request.criteria.into_iter().map(Into::into).collect();
    workflow.target_ids = request.target_ids;
    workflow.updated_at = Utc::now();

    state.store.save_workflow(&workflow).await?;
    Ok(Json(workflow.into()))
}

/// DELETE /api/workflows/{id}
pub async fn delete_workflow(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::WORKFLOW_ACCESS)?;
    if !state.store.delete_workflow(id).await? {
        return Err(ApiError::not_found(format!("workflow {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn validate_label(label: &str) -> Result<(), ApiError> {
    if label.trim().is_empty() {
        return Err(ApiError::bad_request("label cannot be empty"));
    }
    Ok(())
}

async fn validate_targets(state: &AppState, target_ids: &[Uuid]) -> Result<(), ApiError> {
    for target_id in target_ids {
        if state.store.target(*target_id).await?.is_none() {
            return Err(ApiError::bad_request(format!(
                "unknown target {target_id}"
            )));
        }
    }
    Ok(())
}
