//! SGo playground backend library.

pub mod config;
pub mod dispatch;
pub mod execution;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod toolchain;

pub use config::schema::PlaygroundConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
