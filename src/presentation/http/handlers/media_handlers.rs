//! Media Handlers
//!
//! Read surfaces over the library plus deletion (which first cancels
//! any running transcodes for the media) and the watch-target listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::entities::permissions;
use crate::presentation::http::dto::media_dto::{
    EpisodeResponse, MediaContainerResponse, MovieResponse, SeasonResponse, SeriesResponse,
    WatchTargetKind, WatchTargetResponse,
};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// GET /api/media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaContainerResponse>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let container = state
        .store
        .container(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("media {id}")))?;
    Ok(Json(container.into()))
}

/// DELETE /api/media/{id}
///
/// Running transcodes for the media are cancelled before the row goes.
pub async fn delete_media(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;

    state.scheduler.cancel_for_media(id).await?;
    let deleted = state.store.delete_media(id).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("media {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/media/{id}/watch-targets
///
/// The synthetic `Direct` entry is always first, followed by completed
/// artifacts and the remaining live-transcode candidates.
pub async fn get_watch_targets(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WatchTargetResponse>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;

    let container = state
        .store
        .container(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("media {id}")))?;

    let mut watch_targets = vec![WatchTargetResponse {
        kind: WatchTargetKind::Direct,
        label: "Direct".to_string(),
        target_id: None,
        path: Some(container.source_path().to_string()),
    }];

    let records = state.store.transcodes_for_media(id).await?;
    let mut satisfied = Vec::new();
    for record in records.iter().filter(|r| r.state == "completed") {
        satisfied.push(record.target_id);
        let label = state
            .store
            .target(record.target_id)
            .await?
            .map(|t| t.label)
            .unwrap_or_else(|| record.target_id.to_string());
        watch_targets.push(WatchTargetResponse {
            kind: WatchTargetKind::PreTranscoded,
            label,
            target_id: Some(record.target_id),
            path: record.output_path.clone(),
        });
    }

    for target in state.store.targets().await? {
        if satisfied.contains(&target.id) {
            continue;
        }
        watch_targets.push(WatchTargetResponse {
            kind: WatchTargetKind::LiveTranscode,
            label: target.label,
            target_id: Some(target.id),
            path: None,
        });
    }

    Ok(Json(watch_targets))
}

/// GET /api/movies
pub async fn list_movies(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let movies = state.store.movies().await?;
    Ok(Json(movies.into_iter().map(Into::into).collect()))
}

/// GET /api/movies/{id}
pub async fn get_movie(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<MovieResponse>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let movie = state
        .store
        .movie(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("movie {id}")))?;
    Ok(Json(movie.into()))
}

/// GET /api/series
pub async fn list_series(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<SeriesResponse>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let series = state.store.series_list().await?;
    Ok(Json(series.into_iter().map(Into::into).collect()))
}

/// GET /api/series/{id}
pub async fn get_series(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<SeriesResponse>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let series = state
        .store
        .series(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("series {id}")))?;
    Ok(Json(series.into()))
}

/// GET /api/series/{id}/seasons
pub async fn list_seasons(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SeasonResponse>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let seasons = state.store.seasons(id).await?;
    Ok(Json(seasons.into_iter().map(Into::into).collect()))
}

/// GET /api/seasons/{id}/episodes
pub async fn list_episodes(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EpisodeResponse>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let episodes = state.store.episodes(id).await?;
    Ok(Json(episodes.into_iter().map(Into::into).collect()))
}

/// GET /api/episodes/{id}
pub async fn get_episode(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    let episode = state
        .store
        .episode(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("episode {id}")))?;
    Ok(Json(episode.into()))
}

/// GET /api/genres
pub async fn list_genres(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<String>>, ApiError> {
    session.require(permissions::MEDIA_ACCESS)?;
    Ok(Json(state.store.genres().await?))
}
