//! Execution proxy subsystem.
//!
//! # Data Flow
//! ```text
//! translated source
//!     → proxy.rs (form POST: version=2, body=<source>, bounded by timeout)
//!     → remote compile-and-run service
//!     → types.rs (decode Events / Errors, keep body verbatim)
//!     → execute handler
//! ```

pub mod proxy;
pub mod types;

pub use proxy::{ExecutionProxy, ProxyError};
pub use types::{CompileResponse, Event, ExecutionResult};
