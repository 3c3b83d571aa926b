//! Workflow change events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interfaces::messaging::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUpdateEvent {
    pub workflow_id: Uuid,
}

impl WorkflowUpdateEvent {
    pub fn new(workflow_id: Uuid) -> Self {
        Self { workflow_id }
    }
}

impl DomainEvent for WorkflowUpdateEvent {
    fn event_type(&self) -> &'static str {
        "WorkflowUpdate"
    }
}
