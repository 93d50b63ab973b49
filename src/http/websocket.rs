//! Websocket connection endpoint.
//!
//! # Responsibilities
//! - Upgrade `GET /ws` to a websocket, within the connection ceiling
//! - Read loop: decode `{type, value}` messages into envelopes and queue them
//! - Writer task: send the worker's responses as JSON text frames
//!
//! # Data Flow
//! ```text
//! Client ──── frames ────→ read loop ──→ dispatch queue ──→ worker
//! Client ←─── frames ───── writer task ←── connection handle ←──┘
//! ```
//!
//! # Design Decisions
//! - No handler logic runs here
//! - An undecodable frame, a read error or a close frame ends the connection
//! - The writer task is the only owner of the sink

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};

use crate::dispatch::{ClientMessage, ConnectionHandle, DispatchQueue, Envelope};
use crate::http::server::AppState;
use crate::net::ConnectionGuard;

/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let Some(guard) = state.connections.try_track() else {
        tracing::warn!(peer = %peer, "Connection limit reached, refusing websocket");
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    let queue = state.queue.clone();
    ws.max_message_size(state.max_message_bytes)
        .on_failed_upgrade(move |e| tracing::warn!(peer = %peer, error = %e, "Websocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, peer, queue, guard))
}

/// Run one connection until the client goes away.
pub async fn handle_socket(socket: WebSocket, peer: SocketAddr, queue: DispatchQueue, guard: ConnectionGuard) {
    let connection_id = guard.id();
    tracing::info!(connection_id = %connection_id, peer = %peer, "Websocket connection opened");

    let (mut sink, mut stream) = socket.split();
    let (origin, mut outbound) = ConnectionHandle::new(connection_id);

    let writer = tokio::spawn(async move {
        while let Some(response) = outbound.recv().await {
            let text = match serde_json::to_string(&response) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode response");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                tracing::debug!(connection_id = %connection_id, "Websocket send failed, client disconnected");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let decoded = match frame {
            Ok(Message::Text(text)) => serde_json::from_str::<ClientMessage>(text.as_str()),
            Ok(Message::Binary(bytes)) => serde_json::from_slice::<ClientMessage>(&bytes),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::info!(connection_id = %connection_id, error = %e, "Websocket read error");
                break;
            }
        };

        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                tracing::info!(connection_id = %connection_id, error = %e, "Undecodable message, closing connection");
                break;
            }
        };

        if queue.push(Envelope::from_message(message, origin.clone())).is_err() {
            tracing::warn!(connection_id = %connection_id, "Dispatch worker stopped, closing connection");
            break;
        }
    }

    writer.abort();
    drop(guard);
    tracing::info!(connection_id = %connection_id, "Websocket connection closed");
}
