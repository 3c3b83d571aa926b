//! Target entity
//!
//! A named option bundle handed to the transcoder runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One option forwarded verbatim to the runner command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOption {
    /// Option name without the leading dash, e.g. `c:v`
    pub name: String,
    /// Option value; flags carry none
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    pub label: String,
    /// Opaque option bundle consumed by the runner
    pub options: Vec<RunnerOption>,
    /// Declared thread requirement counted against the pool budget
    pub threads: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Target {
    pub fn new(label: String, options: Vec<RunnerOption>, threads: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            label,
            options,
            threads: threads.max(1),
            created_at: now,
            updated_at: now,
        }
    }
}
