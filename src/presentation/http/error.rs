//! HTTP error mapping
//!
//! Every error surfaced by a handler maps onto a status code with a
//! `{status, reason}` body. Internal faults are logged, never leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::shared::error::{ApplicationError, AuthError, DomainError, RepositoryError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub reason: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub reason: String,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, reason)
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, reason)
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, reason)
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, reason)
    }

    fn internal(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!("Internal error: {}", reason);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            reason: self.reason,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(reason) => Self::not_found(reason),
            DomainError::InvalidInput(reason)
            | DomainError::Precondition(reason)
            | DomainError::InvalidState(reason) => Self::bad_request(reason),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(reason) => Self::not_found(reason),
            RepositoryError::Duplicate(reason) => Self::bad_request(reason),
            RepositoryError::Domain(domain) => domain.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized("invalid credentials"),
            AuthError::TokenMissing
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::TokenRevoked => Self::unauthorized(err.to_string()),
            AuthError::PermissionDenied(tag) => {
                Self::forbidden(format!("missing permission: {tag}"))
            }
            AuthError::Hashing(reason) | AuthError::Signing(reason) => Self::internal(reason),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(domain) => domain.into(),
            ApplicationError::Repository(repo) => repo.into(),
            ApplicationError::Auth(auth) => auth.into(),
            other => Self::internal(other.to_string()),
        }
    }
}
