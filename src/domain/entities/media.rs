//! Watchable media entities
//!
//! Movies and episodes are the watchable kinds: they carry a source path
//! and a resolution and are the units transcode tasks operate on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Season, Series};
use crate::domain::value_objects::Resolution;
use crate::shared::error::DomainError;

/// Movie entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    /// External title-database id, unique per media kind
    pub tmdb_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Vec<String>,
    pub source_path: String,
    pub resolution: Resolution,
    pub duration_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// Creates a new movie entity.
    ///
    /// # Errors
    /// Returns error if the tmdb id, title or source path is empty.
    pub fn new(
        tmdb_id: String,
        title: String,
        source_path: String,
        resolution: Resolution,
    ) -> Result<Self, DomainError> {
        if tmdb_id.is_empty() {
            return Err(DomainError::InvalidInput("tmdb id cannot be empty".into()));
        }
        if title.is_empty() {
            return Err(DomainError::InvalidInput("title cannot be empty".into()));
        }
        if source_path.is_empty() {
            return Err(DomainError::InvalidInput(
                "source path cannot be empty".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tmdb_id,
            title,
            overview: None,
            release_year: None,
            genres: Vec::new(),
            source_path,
            resolution,
            duration_secs: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Episode entity; references its season which references the series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub tmdb_id: String,
    pub season_id: Uuid,
    pub episode_number: u32,
    pub title: String,
    pub source_path: String,
    pub resolution: Resolution,
    pub duration_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(
        tmdb_id: String,
        season_id: Uuid,
        episode_number: u32,
        title: String,
        source_path: String,
        resolution: Resolution,
    ) -> Result<Self, DomainError> {
        if tmdb_id.is_empty() {
            return Err(DomainError::InvalidInput("tmdb id cannot be empty".into()));
        }
        if source_path.is_empty() {
            return Err(DomainError::InvalidInput(
                "source path cannot be empty".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tmdb_id,
            season_id,
            episode_number,
            title,
            source_path,
            resolution,
            duration_secs: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A watchable together with its episodic context, the unit workflow
/// criteria are evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaContainer {
    Movie(Movie),
    Episode {
        episode: Episode,
        season: Season,
        series: Series,
    },
}

impl MediaContainer {
    pub fn id(&self) -> Uuid {
        match self {
            MediaContainer::Movie(m) => m.id,
            MediaContainer::Episode { episode, .. } => episode.id,
        }
    }

    pub fn tmdb_id(&self) -> &str {
        match self {
            MediaContainer::Movie(m) => &m.tmdb_id,
            MediaContainer::Episode { episode, .. } => &episode.tmdb_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaContainer::Movie(m) => &m.title,
            MediaContainer::Episode { episode, .. } => &episode.title,
        }
    }

    pub fn source_path(&self) -> &str {
        match self {
            MediaContainer::Movie(m) => &m.source_path,
            MediaContainer::Episode { episode, .. } => &episode.source_path,
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            MediaContainer::Movie(m) => m.resolution,
            MediaContainer::Episode { episode, .. } => episode.resolution,
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            MediaContainer::Movie(m) => m.duration_secs,
            MediaContainer::Episode { episode, .. } => episode.duration_secs,
        }
    }

    pub fn season_number(&self) -> Option<u32> {
        match self {
            MediaContainer::Movie(_) => None,
            MediaContainer::Episode { season, .. } => Some(season.season_number),
        }
    }

    pub fn episode_number(&self) -> Option<u32> {
        match self {
            MediaContainer::Movie(_) => None,
            MediaContainer::Episode { episode, .. } => Some(episode.episode_number),
        }
    }
}
