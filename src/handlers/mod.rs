//! The handler set: format, translate, execute.
//!
//! # Data Flow
//! ```text
//! worker
//!     → format.rs    → toolchain.format     (supervised, timeout)
//!     → translate.rs → toolchain.translate  (supervised, timeout)
//!     → execute.rs   → translate → execution proxy (supervised)
//! ```
//!
//! # Design Decisions
//! - Handlers hold no mutable state; a reload swaps the whole set
//! - Every toolchain call is bounded by `toolchain.timeout_secs`; an
//!   abandoned call drops (and so kills) its child process
//! - A panic inside the toolchain comes back as `Outcome::Faulted`

pub mod execute;
pub mod format;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PlaygroundConfig, ToolchainConfig};
use crate::dispatch::response::{ErrorReport, ResponseValue};
use crate::execution::{ExecutionProxy, ProxyError};
use crate::resilience::supervise::{Fault, Supervised};
use crate::toolchain::{CommandToolchain, Toolchain, ToolchainError};

/// What a handler produced for one request.
#[derive(Debug)]
pub enum Outcome {
    /// The operation succeeded; `None` means there is nothing to show.
    Ok(Option<ResponseValue>),
    /// The input was rejected or a collaborator failed.
    Rejected(ErrorReport),
    /// Untrusted code panicked.
    Faulted(Fault),
}

impl Outcome {
    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok(_) => "ok",
            Outcome::Rejected(_) => "rejected",
            Outcome::Faulted(_) => "fault",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ToolchainCall {
    Format,
    Translate,
}

impl ToolchainCall {
    fn name(self) -> &'static str {
        match self {
            ToolchainCall::Format => "format",
            ToolchainCall::Translate => "translate",
        }
    }
}

/// Toolchain plus execution proxy.
#[derive(Clone)]
pub struct Handlers {
    toolchain: Arc<dyn Toolchain>,
    proxy: ExecutionProxy,
    toolchain_timeout_secs: u64,
}

impl Handlers {
    pub fn new(toolchain: Arc<dyn Toolchain>, proxy: ExecutionProxy) -> Self {
        Self {
            toolchain,
            proxy,
            toolchain_timeout_secs: ToolchainConfig::default().timeout_secs,
        }
    }

    /// Bound each toolchain call to `secs` seconds.
    pub fn with_toolchain_timeout(mut self, secs: u64) -> Self {
        self.toolchain_timeout_secs = secs;
        self
    }

    /// Build the command-backed toolchain and the proxy from configuration.
    pub fn from_config(config: &PlaygroundConfig) -> Result<Self, ProxyError> {
        Ok(Self::new(
            Arc::new(CommandToolchain::new(&config.toolchain)),
            ExecutionProxy::new(&config.execution)?,
        )
        .with_toolchain_timeout(config.toolchain.timeout_secs))
    }

    /// Run one toolchain call inside the failure boundary, bounded by the timeout.
    async fn call_toolchain(
        &self,
        call: ToolchainCall,
        source: &str,
    ) -> Result<Result<String, ToolchainError>, Fault> {
        let toolchain = self.toolchain.as_ref();
        let supervised = Supervised::new(async move {
            match call {
                ToolchainCall::Format => toolchain.format(source).await,
                ToolchainCall::Translate => toolchain.translate(source).await,
            }
        });

        let limit = Duration::from_secs(self.toolchain_timeout_secs);
        match tokio::time::timeout(limit, supervised).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(call = call.name(), timeout_secs = self.toolchain_timeout_secs, "Toolchain call timed out");
                Ok(Err(ToolchainError::Timeout(call.name(), self.toolchain_timeout_secs)))
            }
        }
    }
}
