//! Season entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: Uuid,
    pub series_id: Uuid,
    /// External title-database id; seasons without their own record use a
    /// key derived from the series id and season number
    pub tmdb_id: String,
    pub season_number: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Season {
    pub fn new(series_id: Uuid, tmdb_id: String, season_number: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            series_id,
            tmdb_id,
            season_number,
            created_at: now,
            updated_at: now,
        }
    }
}
