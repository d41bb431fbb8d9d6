//! WebSocket endpoint for reload channels.
//!
//! Each connection registers one channel and forwards its notices to the
//! browser. Inbound frames are ignored; the connection only ends when the
//! browser goes away or a send fails.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;

use super::registry::{ChannelRegistry, RELOAD_MESSAGE};
use crate::state::AppState;

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Serve one reload channel until it closes or errors.
async fn handle_socket(mut socket: WebSocket, registry: Arc<ChannelRegistry>) {
    let (id, mut notices) = registry.register();
    tracing::debug!(channel = %id, "Reload channel opened");

    loop {
        tokio::select! {
            notice = notices.recv() => {
                // None: the registry already dropped this channel
                if notice.is_none() {
                    break;
                }
                if socket.send(Message::Text(RELOAD_MESSAGE.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(id);
    tracing::debug!(channel = %id, "Reload channel closed");
}
