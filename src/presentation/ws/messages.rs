//! Realtime message envelope

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Welcome,
    Update,
    Response,
    ErrorResponse,
    /// Reserved for historical compatibility; never accepted inbound
    Command,
}

/// Envelope for every message on the realtime channel
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    pub title: String,
    pub body: serde_json::Value,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RealtimeMessage {
    pub fn welcome(connection_id: Uuid, body: serde_json::Value) -> Self {
        Self {
            title: "Welcome".to_string(),
            body,
            message_type: MessageType::Welcome,
            id: Some(connection_id),
            target: None,
        }
    }

    pub fn update(title: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            title: title.into(),
            body,
            message_type: MessageType::Update,
            id: None,
            target: None,
        }
    }
}

/// Minimal inbound shape, read only to recognise (and drop) commands
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub message_type: Option<MessageType>,
}
