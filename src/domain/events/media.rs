//! Media change events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interfaces::messaging::DomainEvent;

/// Published strictly after the persistence transaction for a new
/// watchable commits. Drives the workflow matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPersistedEvent {
    pub media_id: Uuid,
}

impl MediaPersistedEvent {
    pub fn new(media_id: Uuid) -> Self {
        Self { media_id }
    }
}

impl DomainEvent for MediaPersistedEvent {
    fn event_type(&self) -> &'static str {
        "MediaPersisted"
    }
}

/// Published when an existing media row changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaUpdateEvent {
    pub media_id: Uuid,
}

impl MediaUpdateEvent {
    pub fn new(media_id: Uuid) -> Self {
        Self { media_id }
    }
}

impl DomainEvent for MediaUpdateEvent {
    fn event_type(&self) -> &'static str {
        "MediaUpdate"
    }
}
