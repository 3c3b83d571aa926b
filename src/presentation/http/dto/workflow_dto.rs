//! Workflow DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Combine, Criterion, CriterionKey, CriterionOp, Workflow};

#[derive(Debug, Serialize, Deserialize)]
pub struct CriterionDto {
    pub combine: Combine,
    pub key: CriterionKey,
    pub op: CriterionOp,
    pub value: String,
}

impl From<Criterion> for CriterionDto {
    fn from(criterion: Criterion) -> Self {
        Self {
            combine: criterion.combine,
            key: criterion.key,
            op: criterion.op,
            value: criterion.value,
        }
    }
}

impl From<CriterionDto> for Criterion {
    fn from(dto: CriterionDto) -> Self {
        Self {
            combine: dto.combine,
            key: dto.key,
            op: dto.op,
            value: dto.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub id: Uuid,
    pub label: String,
    pub enabled: bool,
    pub criteria: Vec<CriterionDto>,
    pub target_ids: Vec<Uuid>,
    pub created_at: String,
}

impl From<Workflow> for WorkflowResponse {
    fn from(workflow: Workflow) -> Self {
        Self {
            id: workflow.id,
            label: workflow.label,
            enabled: workflow.enabled,
            criteria: workflow.criteria.into_iter().map(Into::into).collect(),
            target_ids: workflow.target_ids,
            created_at: workflow.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveWorkflowRequest {
    pub label: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub criteria: Vec<CriterionDto>,
    #[serde(default)]
    pub target_ids: Vec<Uuid>,
}

fn default_enabled() -> bool {
    true
}
