//! Transcode task state and progress value objects

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a transcode task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    Running,
    Cancelled,
    Failed { reason: String },
    Completed { output_path: PathBuf },
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Waiting => "waiting",
            TaskState::Running => "running",
            TaskState::Cancelled => "cancelled",
            TaskState::Failed { .. } => "failed",
            TaskState::Completed { .. } => "completed",
        }
    }

    /// Terminal states release the thread budget and are never left.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Cancelled | TaskState::Failed { .. } | TaskState::Completed { .. }
        )
    }

    /// Waiting or Running.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Latest progress sample reported by the runner for a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Percent complete, 0.0 to 100.0 (best effort; requires a duration)
    pub percent: Option<f32>,
    /// Encoder speed relative to realtime, e.g. 3.1 for `3.1x`
    pub speed: Option<f32>,
    /// Output bitrate in kbit/s
    pub bitrate_kbps: Option<f64>,
    /// Seconds of output produced so far
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_classification() {
        assert!(!TaskState::Waiting.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(TaskState::Failed {
            reason: "x".to_string()
        }
        .is_terminal());
        assert!(TaskState::Completed {
            output_path: PathBuf::from("/out/a.mkv")
        }
        .is_terminal());
    }
}
