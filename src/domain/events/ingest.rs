//! Ingest pipeline events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interfaces::messaging::DomainEvent;

/// Published on every ingest item state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestUpdateEvent {
    pub item_id: Uuid,
}

impl IngestUpdateEvent {
    pub fn new(item_id: Uuid) -> Self {
        Self { item_id }
    }
}

impl DomainEvent for IngestUpdateEvent {
    fn event_type(&self) -> &'static str {
        "IngestUpdate"
    }
}
