//! Ingest item entity
//!
//! In-memory record tracking a single source file through the ingest
//! pipeline. Owned exclusively by the ingest service; never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::value_objects::{ProbeReport, Trouble};

/// Ingest item lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    /// File is younger than the modtime threshold; a timer will promote it
    ImportHold,
    /// Ready for a worker to claim
    Idle,
    /// Claimed by exactly one worker
    Ingesting,
    /// Awaiting user resolution
    Troubled,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestState::ImportHold => "import_hold",
            IngestState::Idle => "idle",
            IngestState::Ingesting => "ingesting",
            IngestState::Troubled => "troubled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestItem {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub state: IngestState,
    pub probed: Option<ProbeReport>,
    pub trouble: Option<Trouble>,
    /// Set once the item's media row has been committed
    pub media_id: Option<Uuid>,
}

impl IngestItem {
    pub fn new(source_path: PathBuf, state: IngestState) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            state,
            probed: None,
            trouble: None,
            media_id: None,
        }
    }
}

/// Durable trace of a completed ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub id: Uuid,
    pub source_path: String,
    pub media_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

impl IngestRecord {
    pub fn new(source_path: String, media_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            media_id,
            completed_at: Utc::now(),
        }
    }
}
