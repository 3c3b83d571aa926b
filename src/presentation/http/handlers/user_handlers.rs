//! User Administration Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::entities::{permissions, User};
use crate::infrastructure::auth::password;
use crate::presentation::http::dto::user_dto::{CreateUserRequest, UserResponse};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    session.require(permissions::USER_ADMIN)?;
    let users = state.store.users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    session.require(permissions::USER_ADMIN)?;
    let user = state
        .store
        .user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {id}")))?;
    Ok(Json(user.into()))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::USER_ADMIN)?;

    if request.username.trim().is_empty() {
        return Err(ApiError::bad_request("username cannot be empty"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    for tag in &request.permissions {
        if !permissions::ALL.contains(&tag.as_str()) {
            return Err(ApiError::bad_request(format!("unknown permission: {tag}")));
        }
    }
    if state
        .store
        .user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("username already taken"));
    }

    let hash = password::hash_password(&request.password)?;
    let user = User::new(request.username, hash, request.permissions);
    state.store.create_user(&user).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::USER_ADMIN)?;
    if id == session.user_id {
        return Err(ApiError::bad_request("cannot delete the current user"));
    }
    if !state.store.delete_user(id).await? {
        return Err(ApiError::not_found(format!("user {id}")));
    }
    // Whatever sessions the user held die with the account
    state.tokens.revoke_all_for(id);
    Ok(StatusCode::NO_CONTENT)
}
