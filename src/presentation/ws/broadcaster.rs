//! Realtime broadcaster
//!
//! Consumes the activity-bus channels for the fan-out topics and
//! forwards each event to the hub with its required permission tag.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::hub::WsHub;
use super::messages::RealtimeMessage;
use crate::domain::entities::permissions;
use crate::domain::events::{
    IngestUpdateEvent, MediaPersistedEvent, MediaUpdateEvent, TranscodeTaskProgressUpdateEvent,
    TranscodeTaskUpdateEvent, UserTokensRevokedEvent, WorkflowUpdateEvent,
};
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::interfaces::messaging::{DomainEvent, EventBus};

/// Events buffered per topic before the oldest is dropped
const TOPIC_BUFFER: usize = 256;

pub struct RealtimeBroadcaster {
    hub: Arc<WsHub>,
    bus: Arc<InMemoryEventBus>,
    shutdown: CancellationToken,
}

impl RealtimeBroadcaster {
    pub fn new(hub: Arc<WsHub>, bus: Arc<InMemoryEventBus>, shutdown: CancellationToken) -> Self {
        Self { hub, bus, shutdown }
    }

    /// Spawns one forwarding loop per fan-out topic.
    pub async fn start(&self) {
        self.forward::<IngestUpdateEvent>(permissions::INGEST_ACCESS)
            .await;
        self.forward::<MediaPersistedEvent>(permissions::MEDIA_ACCESS)
            .await;
        self.forward::<MediaUpdateEvent>(permissions::MEDIA_ACCESS)
            .await;
        self.forward::<WorkflowUpdateEvent>(permissions::WORKFLOW_ACCESS)
            .await;
        self.forward::<TranscodeTaskUpdateEvent>(permissions::TRANSCODE_ACCESS)
            .await;
        self.forward::<TranscodeTaskProgressUpdateEvent>(permissions::TRANSCODE_ACCESS)
            .await;
        self.forward::<UserTokensRevokedEvent>(permissions::USER_ADMIN)
            .await;
        info!("Realtime broadcaster started");
    }

    async fn forward<T: DomainEvent>(&self, required_permission: &'static str) {
        let mut rx = self.bus.subscribe_channel::<T>(TOPIC_BUFFER).await;
        let hub = self.hub.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => {
                        let Some(event) = event else { break };
                        let title = event.event_type();
                        let body = match serde_json::to_value(&event) {
                            Ok(body) => body,
                            Err(e) => {
                                tracing::error!("Unencodable event on {}: {}", title, e);
                                continue;
                            }
                        };
                        hub.broadcast(required_permission, RealtimeMessage::update(title, body))
                            .await;
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
        });
    }
}
