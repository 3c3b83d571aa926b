//! Realtime websocket endpoint
//!
//! Upgrades an authenticated HTTP request, sends the `Welcome` message
//! with the connection id and a per-user snapshot, then pumps hub
//! messages outward. Inbound `Command` messages are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::messages::{InboundMessage, MessageType, RealtimeMessage};
use crate::presentation::http::dto::user_dto::UserResponse;
use crate::presentation::http::middleware::AuthSession;
use crate::presentation::http::state::AppState;

/// Outbound messages buffered per connection before it is dropped
const OUTBOUND_BUFFER: usize = 64;

/// GET /api/activity/ws
pub async fn ws_handler(
    State(state): State<AppState>,
    session: AuthSession,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(state, session, socket))
}

async fn handle_socket(state: AppState, session: AuthSession, socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
    let connection_id = state
        .ws_hub
        .register(session.user_id, session.claims.permissions.clone(), tx)
        .await;

    let snapshot_user = state
        .store
        .user(session.user_id)
        .await
        .ok()
        .flatten()
        .map(UserResponse::from);
    let welcome = RealtimeMessage::welcome(
        connection_id,
        json!({
            "connection_id": connection_id,
            "user": snapshot_user,
        }),
    );

    let (mut sink, mut stream) = socket.split();

    if send_message(&mut sink, &welcome).await.is_err() {
        state.ws_hub.unregister(connection_id).await;
        return;
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                // None means the hub dropped us (overflow or shutdown)
                let Some(message) = outbound else { break };
                if send_message(&mut sink, &message).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(parsed) = serde_json::from_str::<InboundMessage>(&text) {
                            if parsed.message_type == Some(MessageType::Command) {
                                debug!(
                                    "Ignoring Command message on connection {}",
                                    connection_id
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Realtime connection {} errored: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.ws_hub.unregister(connection_id).await;
}

async fn send_message(
    sink: &mut (impl futures::Sink<Message, Error = axum::Error> + Unpin),
    message: &RealtimeMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;
    sink.send(Message::Text(text)).await
}
