//! Websocket connection identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count open connections and enforce the configured ceiling
//! - Keep the active-connections gauge current

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open websocket connections.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
    max_connections: u64,
}

impl ConnectionTracker {
    /// Create a tracker admitting at most `max_connections` open connections.
    pub fn new(max_connections: usize) -> Self {
        Self {
            active_count: Arc::new(AtomicU64::new(0)),
            max_connections: max_connections as u64,
        }
    }

    /// Reserve a slot for a new connection.
    ///
    /// Returns `None` when the ceiling is reached. The slot is released when
    /// the returned guard is dropped.
    pub fn try_track(&self) -> Option<ConnectionGuard> {
        let admitted = self
            .active_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < self.max_connections).then_some(current + 1)
            });

        match admitted {
            Ok(previous) => {
                metrics::set_active_connections(previous + 1);
                Some(ConnectionGuard {
                    active_count: Arc::clone(&self.active_count),
                    id: ConnectionId::new(),
                })
            }
            Err(_) => None,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let previous = self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::set_active_connections(previous.saturating_sub(1));
        tracing::trace!(connection_id = %self.id, "Connection released");
    }
}
