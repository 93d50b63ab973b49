//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake)
//!     → HTTP layer (upgrade to websocket)
//!     → connection.rs (identity, admission, lifetime tracking)
//! ```
//!
//! # Design Decisions
//! - Open websocket count is capped; excess upgrades are refused with 503
//! - Each connection gets a process-unique ID used in every log line
//! - TLS is optional and handled transparently

pub mod connection;
pub mod tls;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
