//! Per-connection response writer handle.
//!
//! The websocket sink is owned by the connection's writer task; this handle
//! only feeds it. The worker is the sole producer, so writes to one
//! connection are serialized without locking.

use tokio::sync::mpsc;

use crate::dispatch::response::Response;
use crate::net::ConnectionId;

/// Reference to a client connection, held by envelopes and the worker.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Response>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver drained by the connection's writer task.
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Response>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { id, outbound }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a response for the client.
    ///
    /// Returns `false` and drops the response when the connection is gone.
    pub fn send(&self, response: Response) -> bool {
        if self.outbound.send(response).is_err() {
            tracing::debug!(connection_id = %self.id, "Connection closed, response discarded");
            return false;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}
