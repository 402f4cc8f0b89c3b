//! WebSocket connection handling

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use gridlock_core::{ClientMessage, ConnectionHandle, JoinOutcome, ServerMessage};
use tracing::{debug, error, info, warn};

use crate::{AppState, ServerError};

/// How long queued messages may take to flush after the client goes away
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::channel();
    let connection_id = handle.id();

    info!(%connection_id, "WebSocket client connected");

    // Sessions queue messages on the channel; only this task touches the socket
    let mut writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to encode message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Process incoming messages
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_text_message(&text, &state, &handle) {
                    warn!(%connection_id, "Dropping connection: {}", e);
                    handle.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!(%connection_id, "WebSocket client sent close frame");
                break;
            }
            Ok(_) => {
                // Pings are answered by axum; binary and pong frames are ignored
            }
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    let outcome = state.hub.handle_disconnect(connection_id);
    debug!(%connection_id, ?outcome, "Connection released");

    drop(handle);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        writer.abort();
    }

    info!(%connection_id, "WebSocket client disconnected");
}

/// Handle a text message from the client
///
/// Only undecodable frames are errors; everything the hub ignores is fine.
fn handle_text_message(
    text: &str,
    state: &Arc<AppState>,
    handle: &ConnectionHandle,
) -> Result<(), ServerError> {
    let client_msg: ClientMessage =
        serde_json::from_str(text).map_err(|e| ServerError::InvalidMessage(e.to_string()))?;

    match client_msg {
        ClientMessage::Join { username } => {
            let username = username.trim();
            if username.is_empty() {
                handle.send(ServerMessage::Error {
                    message: "Username must not be empty".to_string(),
                });
                return Ok(());
            }
            let outcome = state.hub.add_player(handle.clone(), username);
            debug!(connection_id = %handle.id(), %username, ?outcome, "Join handled");
            if outcome == JoinOutcome::ReservedName {
                handle.send(ServerMessage::Error {
                    message: format!("Username {} is reserved", username),
                });
            }
        }

        ClientMessage::Move { column } => {
            let outcome = state.hub.handle_move(handle.id(), column);
            debug!(connection_id = %handle.id(), column, ?outcome, "Move handled");
        }

        ClientMessage::Ping => {}
    }

    Ok(())
}
