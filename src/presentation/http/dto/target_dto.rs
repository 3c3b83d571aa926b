//! Target DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{RunnerOption, Target};

#[derive(Debug, Serialize)]
pub struct TargetResponse {
    pub id: Uuid,
    pub label: String,
    pub options: Vec<RunnerOption>,
    pub threads: u32,
    pub created_at: String,
}

impl From<Target> for TargetResponse {
    fn from(target: Target) -> Self {
        Self {
            id: target.id,
            label: target.label,
            options: target.options,
            threads: target.threads,
            created_at: target.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveTargetRequest {
    pub label: String,
    #[serde(default)]
    pub options: Vec<RunnerOption>,
    #[serde(default = "default_threads")]
    pub threads: u32,
}

fn default_threads() -> u32 {
    1
}
