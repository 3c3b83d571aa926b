//! Transcode task events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ProgressSample;
use crate::interfaces::messaging::DomainEvent;

/// Published on task state transitions. For a given task the first
/// update precedes any progress update and the terminal update is the
/// last event carrying that task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeTaskUpdateEvent {
    pub task_id: Uuid,
}

impl TranscodeTaskUpdateEvent {
    pub fn new(task_id: Uuid) -> Self {
        Self { task_id }
    }
}

impl DomainEvent for TranscodeTaskUpdateEvent {
    fn event_type(&self) -> &'static str {
        "TranscodeTaskUpdate"
    }
}

/// Published for progress samples, rate-limited per task by the
/// scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeTaskProgressUpdateEvent {
    pub task_id: Uuid,
    pub progress: ProgressSample,
}

impl TranscodeTaskProgressUpdateEvent {
    pub fn new(task_id: Uuid, progress: ProgressSample) -> Self {
        Self { task_id, progress }
    }
}

impl DomainEvent for TranscodeTaskProgressUpdateEvent {
    fn event_type(&self) -> &'static str {
        "TranscodeTaskProgressUpdate"
    }
}
