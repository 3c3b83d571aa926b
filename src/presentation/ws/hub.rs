//! Realtime connection hub
//!
//! Holds every live connection with the permission set snapshotted at
//! connect time. Delivery is permission-filtered; a connection whose
//! bounded outbound queue overflows is dropped.

use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::messages::RealtimeMessage;

struct ConnectionHandle {
    user_id: Uuid,
    permissions: HashSet<String>,
    sender: mpsc::Sender<RealtimeMessage>,
}

#[derive(Default)]
pub struct WsHub {
    connections: RwLock<HashMap<Uuid, ConnectionHandle>>,
}

impl WsHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its server-assigned id.
    pub async fn register(
        &self,
        user_id: Uuid,
        permissions: Vec<String>,
        sender: mpsc::Sender<RealtimeMessage>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let handle = ConnectionHandle {
            user_id,
            permissions: permissions.into_iter().collect(),
            sender,
        };
        self.connections.write().await.insert(id, handle);
        debug!("Realtime connection {} registered for {}", id, user_id);
        id
    }

    pub async fn unregister(&self, id: Uuid) {
        if self.connections.write().await.remove(&id).is_some() {
            debug!("Realtime connection {} removed", id);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Delivers to every connection holding the required permission.
    /// Overflowing or closed connections are dropped from the hub, which
    /// ends their writer task.
    pub async fn broadcast(&self, required_permission: &str, message: RealtimeMessage) {
        let mut stale = Vec::new();
        {
            let connections = self.connections.read().await;
            for (id, handle) in connections.iter() {
                if !handle.permissions.contains(required_permission) {
                    continue;
                }
                match handle.sender.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            "Realtime connection {} (user {}) overflowed its outbound queue; closing",
                            id, handle.user_id
                        );
                        stale.push(*id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(*id),
                }
            }
        }
        for id in stale {
            self.unregister(id).await;
        }
    }
}
