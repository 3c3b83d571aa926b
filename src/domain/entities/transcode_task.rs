//! Transcode task entities
//!
//! `TranscodeTask` is the scheduler-owned in-memory record; terminal
//! outcomes are additionally written to the store as `TranscodeRecord`
//! history rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ProgressSample, TaskState};

/// A scheduled or running instance of the transcoder for one
/// (media, target) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeTask {
    pub id: Uuid,
    pub media_id: Uuid,
    pub target_id: Uuid,
    pub state: TaskState,
    pub last_progress: Option<ProgressSample>,
    /// Declared thread requirement counted against the pool budget
    pub threads: u32,
    /// Important tasks reserve the pool: nothing else is admitted while
    /// one is waiting
    pub important: bool,
    pub enqueued_at: DateTime<Utc>,
}

impl TranscodeTask {
    pub fn new(media_id: Uuid, target_id: Uuid, threads: u32, important: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            target_id,
            state: TaskState::Waiting,
            last_progress: None,
            threads,
            important,
            enqueued_at: Utc::now(),
        }
    }
}

/// Durable record of a finished transcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeRecord {
    pub id: Uuid,
    pub media_id: Uuid,
    pub target_id: Uuid,
    /// Terminal state tag: completed, failed or cancelled
    pub state: String,
    /// Canonical pre-transcoded artifact for the pair, when completed
    pub output_path: Option<String>,
    pub failure_reason: Option<String>,
    pub finished_at: DateTime<Utc>,
}
