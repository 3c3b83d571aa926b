//! Series entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: Uuid,
    /// External title-database id, unique per media kind
    pub tmdb_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Series {
    pub fn new(tmdb_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tmdb_id,
            title,
            overview: None,
            genres: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
