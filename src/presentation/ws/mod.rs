//! Realtime Module
//!
//! Websocket hub, permission-filtered broadcaster and the upgrade
//! endpoint.

pub mod broadcaster;
pub mod handler;
pub mod hub;
pub mod messages;

pub use broadcaster::RealtimeBroadcaster;
pub use hub::WsHub;
pub use messages::{MessageType, RealtimeMessage};
