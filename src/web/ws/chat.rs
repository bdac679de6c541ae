//! Chat WebSocket handler.
//!
//! Each connection gets a fresh session id and an outbox. Incoming frames are
//! parsed into commands and forwarded to the chat processor; pushes queued on
//! the outbox are written back in order.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;

use crate::chat::{self, Command, Push};
use crate::web::handlers::AppState;

/// WebSocket chat handler.
///
/// GET /ws
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(session_id = %session_id, "WebSocket session started");

    // Split the socket into sender and receiver
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (outbox, mut inbox) = chat::outbox();
    // The coordinator holds the only strong sender, so dropping a stalled
    // session closes the inbox and ends this loop.
    let local = outbox.downgrade();
    if let Err(e) = state.coordinator.connect(&session_id, outbox) {
        tracing::warn!(error = %e, "Rejecting WebSocket connection");
        let _ = send_push(&mut ws_sender, &Push::from(&e)).await;
        return;
    }

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages
            msg_result = ws_receiver.next() => {
                let Some(msg_result) = msg_result else {
                    break;
                };
                match msg_result {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<Command>(&text) {
                            Ok(command) => {
                                if state.coordinator.command(&session_id, command).is_err() {
                                    tracing::warn!(session_id = %session_id, "Chat processor stopped");
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!("Failed to parse client message: {}", e);
                                if let Some(outbox) = local.upgrade() {
                                    let _ = outbox.try_send(Push::error("invalid_message", "Invalid message format"));
                                }
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::debug!("WebSocket closed by client: {}", session_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Write queued pushes
            push = inbox.recv() => {
                let Some(push) = push else {
                    break;
                };
                if send_push(&mut ws_sender, &push).await.is_err() {
                    break;
                }
            }
        }
    }

    // Cleanup: leave the chat
    let _ = state.coordinator.disconnect(&session_id);
    tracing::debug!("WebSocket session ended: {}", session_id);
}

/// Serialize and write one push.
async fn send_push(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    push: &Push,
) -> Result<(), axum::Error> {
    match serde_json::to_string(push) {
        Ok(json) => ws_sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!("Failed to serialize push: {}", e);
            Ok(())
        }
    }
}
