//! Boundary to the external source translator and formatter.
//!
//! # Design Decisions
//! - Calls are asynchronous so the handler can bound them with a timeout;
//!   dropping an unfinished call must release whatever it started
//! - Implementations are untrusted: they may fail, hang or panic, so every
//!   call is made inside the failure boundary
//! - Multiple independent diagnostics are kept as a list, in emission order

pub mod command;

use async_trait::async_trait;
use thiserror::Error;

pub use command::CommandToolchain;

/// Errors reported by a toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The input was rejected with one or more independent diagnostics.
    #[error("{}", .0.join("\n"))]
    Diagnostics(Vec<String>),

    /// The tool failed without structured diagnostics.
    #[error("{0}")]
    Failed(String),

    /// The tool did not finish within the configured limit.
    #[error("{0} timed out after {1} seconds")]
    Timeout(&'static str, u64),

    /// The tool could not be run.
    #[error("toolchain I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source-to-source translator and formatter.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Return the canonical formatting of `source`.
    async fn format(&self, source: &str) -> Result<String, ToolchainError>;

    /// Translate `source`, treated as one complete file, into target source.
    async fn translate(&self, source: &str) -> Result<String, ToolchainError>;
}
