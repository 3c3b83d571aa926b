//! Authentication Middleware
//!
//! Verifies the access token on every gated request, auto-refreshes the
//! cookie pair when the access token nears expiry, and makes the
//! verified session available to handlers as an extension.

use axum::body::Body;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::infrastructure::auth::{AccessClaims, TokenPair};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::state::AppState;
use crate::shared::error::AuthError;

pub const ACCESS_COOKIE: &str = "mediamill_access";
pub const REFRESH_COOKIE: &str = "mediamill_refresh";

/// Verified session attached to gated requests
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub claims: AccessClaims,
}

impl AuthSession {
    /// Checks one required permission tag.
    pub fn require(&self, tag: &str) -> Result<(), ApiError> {
        if self.claims.permissions.iter().any(|p| p == tag) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(tag.to_string()).into())
        }
    }

    /// Checks that every required tag is present.
    pub fn require_all(&self, tags: &[&str]) -> Result<(), ApiError> {
        for tag in tags {
            self.require(tag)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("no session"))
    }
}

/// Builds the HTTP-only cookie pair for a freshly minted token pair.
pub fn session_cookies(pair: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let access = Cookie::build((ACCESS_COOKIE, pair.access.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    let refresh = Cookie::build((REFRESH_COOKIE, pair.refresh.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (access, refresh)
}

/// Expired cookies clearing the session.
pub fn clearing_cookies() -> (Cookie<'static>, Cookie<'static>) {
    let mut access = Cookie::build((ACCESS_COOKIE, "")).path("/").build();
    access.make_removal();
    let mut refresh = Cookie::build((REFRESH_COOKIE, "")).path("/").build();
    refresh.make_removal();
    (access, refresh)
}

/// Gating middleware for protected routes.
///
/// Token refresh never suspends the request: verification is an inline
/// signature check, and rewritten cookies ride on the response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let access_raw = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::unauthorized("no access token"))?;

    let claims = state.tokens.verify_access(&access_raw)?;

    // Sliding refresh: mint a fresh pair while the session is active
    let refreshed = if state.tokens.needs_refresh(&claims) {
        let refresh_raw = jar
            .get(REFRESH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::unauthorized("no refresh token"))?;
        let refresh_claims = state.tokens.verify_refresh(&refresh_raw)?;
        Some(
            state
                .tokens
                .reissue(refresh_claims.sub, claims.permissions.clone())?,
        )
    } else {
        None
    };

    let session = AuthSession {
        user_id: claims.sub,
        claims,
    };
    req.extensions_mut().insert(session);

    let response = next.run(req).await;

    match refreshed {
        Some(pair) => {
            let (access, refresh) = session_cookies(&pair);
            let jar = jar.add(access).add(refresh);
            Ok((jar, response).into_response())
        }
        None => Ok(response),
    }
}
