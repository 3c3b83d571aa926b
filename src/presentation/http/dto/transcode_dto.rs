//! Transcode DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{TranscodeRecord, TranscodeTask};
use crate::domain::value_objects::{ProgressSample, TaskState};

#[derive(Debug, Serialize)]
pub struct TranscodeTaskResponse {
    pub id: Uuid,
    pub media_id: Uuid,
    pub target_id: Uuid,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSample>,
    pub threads: u32,
    pub important: bool,
    pub enqueued_at: String,
}

impl From<TranscodeTask> for TranscodeTaskResponse {
    fn from(task: TranscodeTask) -> Self {
        let (failure_reason, output_path) = match &task.state {
            TaskState::Failed { reason } => (Some(reason.clone()), None),
            TaskState::Completed { output_path } => {
                (None, Some(output_path.to_string_lossy().to_string()))
            }
            _ => (None, None),
        };
        Self {
            id: task.id,
            media_id: task.media_id,
            target_id: task.target_id,
            state: task.state.as_str().to_string(),
            failure_reason,
            output_path,
            progress: task.last_progress,
            threads: task.threads,
            important: task.important,
            enqueued_at: task.enqueued_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscodeRecordResponse {
    pub id: Uuid,
    pub media_id: Uuid,
    pub target_id: Uuid,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub finished_at: String,
}

impl From<TranscodeRecord> for TranscodeRecordResponse {
    fn from(record: TranscodeRecord) -> Self {
        Self {
            id: record.id,
            media_id: record.media_id,
            target_id: record.target_id,
            state: record.state,
            output_path: record.output_path,
            failure_reason: record.failure_reason,
            finished_at: record.finished_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub media_id: Uuid,
    pub target_id: Uuid,
    #[serde(default)]
    pub important: bool,
}
