//! Translate handler.

use crate::dispatch::response::{ErrorReport, ResponseValue};
use crate::handlers::{Handlers, Outcome, ToolchainCall};
use crate::resilience::supervise::Fault;
use crate::toolchain::ToolchainError;

impl Handlers {
    /// Translate `source` as one complete file.
    pub async fn translate(&self, source: String) -> Outcome {
        match self.translate_source(&source).await {
            Ok(Ok(translated)) => Outcome::Ok(Some(ResponseValue::Text(translated))),
            Ok(Err(e)) => Outcome::Rejected(ErrorReport::from(e)),
            Err(fault) => Outcome::Faulted(fault),
        }
    }

    pub(crate) async fn translate_source(
        &self,
        source: &str,
    ) -> Result<Result<String, ToolchainError>, Fault> {
        self.call_toolchain(ToolchainCall::Translate, source).await
    }
}
