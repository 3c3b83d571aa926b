//! Workflow matcher
//!
//! Subscribed to `MediaPersisted`. Evaluates every enabled workflow's
//! criteria against the new media and enqueues one transcode job per
//! attached target that has neither an active nor a completed task for
//! the pair.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::services::{StoreService, TranscodeService};
use crate::domain::events::MediaPersistedEvent;
use crate::domain::services::criteria;
use crate::interfaces::messaging::EventHandler;
use crate::shared::error::MessagingError;

pub struct MediaPersistedHandler {
    store: Arc<StoreService>,
    scheduler: Arc<TranscodeService>,
}

impl MediaPersistedHandler {
    pub fn new(store: Arc<StoreService>, scheduler: Arc<TranscodeService>) -> Self {
        Self { store, scheduler }
    }
}

#[async_trait]
impl EventHandler<MediaPersistedEvent> for MediaPersistedHandler {
    async fn handle(&self, event: MediaPersistedEvent) -> Result<(), MessagingError> {
        let container = self
            .store
            .container(event.media_id)
            .await
            .map_err(|e| MessagingError::HandlerError(e.to_string()))?;

        let Some(container) = container else {
            warn!("MediaPersisted for unknown media {}", event.media_id);
            return Ok(());
        };

        let workflows = self
            .store
            .enabled_workflows()
            .await
            .map_err(|e| MessagingError::HandlerError(e.to_string()))?;

        for workflow in workflows {
            if !criteria::evaluate(&workflow.criteria, &container) {
                debug!(
                    "Workflow {:?} did not match media {}",
                    workflow.label, event.media_id
                );
                continue;
            }

            for target_id in &workflow.target_ids {
                if self
                    .scheduler
                    .active_for_media_and_target(event.media_id, *target_id)
                    .is_some()
                {
                    continue;
                }
                let completed = self
                    .store
                    .has_completed_transcode(event.media_id, *target_id)
                    .await
                    .map_err(|e| MessagingError::HandlerError(e.to_string()))?;
                if completed {
                    continue;
                }

                match self
                    .scheduler
                    .enqueue(event.media_id, *target_id, false)
                    .await
                {
                    Ok(task) => info!(
                        "Workflow {:?} enqueued transcode {} for media {}",
                        workflow.label, task.id, event.media_id
                    ),
                    Err(e) => warn!(
                        "Workflow {:?} could not enqueue target {}: {}",
                        workflow.label, target_id, e
                    ),
                }
            }
        }

        Ok(())
    }
}
