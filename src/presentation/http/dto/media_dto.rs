//! Media DTOs

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{Episode, MediaContainer, Movie, Season, Series};

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: Uuid,
    pub tmdb_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Vec<String>,
    pub source_path: String,
    pub resolution: String,
    pub duration_secs: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            tmdb_id: movie.tmdb_id,
            title: movie.title,
            overview: movie.overview,
            release_year: movie.release_year,
            genres: movie.genres,
            source_path: movie.source_path,
            resolution: movie.resolution.to_string(),
            duration_secs: movie.duration_secs,
            created_at: movie.created_at.to_rfc3339(),
            updated_at: movie.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub id: Uuid,
    pub tmdb_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    pub created_at: String,
}

impl From<Series> for SeriesResponse {
    fn from(series: Series) -> Self {
        Self {
            id: series.id,
            tmdb_id: series.tmdb_id,
            title: series.title,
            overview: series.overview,
            genres: series.genres,
            created_at: series.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeasonResponse {
    pub id: Uuid,
    pub series_id: Uuid,
    pub tmdb_id: String,
    pub season_number: u32,
}

impl From<Season> for SeasonResponse {
    fn from(season: Season) -> Self {
        Self {
            id: season.id,
            series_id: season.series_id,
            tmdb_id: season.tmdb_id,
            season_number: season.season_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EpisodeResponse {
    pub id: Uuid,
    pub tmdb_id: String,
    pub season_id: Uuid,
    pub episode_number: u32,
    pub title: String,
    pub source_path: String,
    pub resolution: String,
    pub duration_secs: Option<f64>,
}

impl From<Episode> for EpisodeResponse {
    fn from(episode: Episode) -> Self {
        Self {
            id: episode.id,
            tmdb_id: episode.tmdb_id,
            season_id: episode.season_id,
            episode_number: episode.episode_number,
            title: episode.title,
            source_path: episode.source_path,
            resolution: episode.resolution.to_string(),
            duration_secs: episode.duration_secs,
        }
    }
}

/// A watchable with its episodic context
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaContainerResponse {
    Movie {
        movie: MovieResponse,
    },
    Episode {
        episode: EpisodeResponse,
        season: SeasonResponse,
        series: SeriesResponse,
    },
}

impl From<MediaContainer> for MediaContainerResponse {
    fn from(container: MediaContainer) -> Self {
        match container {
            MediaContainer::Movie(movie) => MediaContainerResponse::Movie {
                movie: movie.into(),
            },
            MediaContainer::Episode {
                episode,
                season,
                series,
            } => MediaContainerResponse::Episode {
                episode: episode.into(),
                season: season.into(),
                series: series.into(),
            },
        }
    }
}

/// One way to watch a media item
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchTargetKind {
    /// The original source file, always available
    Direct,
    /// A completed transcode artifact
    PreTranscoded,
    /// A target that could be transcoded on demand
    LiveTranscode,
}

#[derive(Debug, Serialize)]
pub struct WatchTargetResponse {
    pub kind: WatchTargetKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
