//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, worker startup)
//!     → GET /ws     → websocket.rs (connection endpoint)
//!     → GET /       → page.rs (playground page)
//!     → GET /status → page.rs (status report)
//! ```

pub mod page;
pub mod server;
pub mod websocket;

pub use server::{AppState, HttpServer, ServerError};
