//! Format handler.

use crate::dispatch::response::ResponseValue;
use crate::handlers::{Handlers, Outcome, ToolchainCall};

impl Handlers {
    /// Canonically format `source`.
    ///
    /// Best effort: source the formatter rejects yields an empty value.
    pub async fn format(&self, source: String) -> Outcome {
        match self.call_toolchain(ToolchainCall::Format, &source).await {
            Ok(Ok(formatted)) => Outcome::Ok(Some(ResponseValue::Text(formatted))),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Formatter rejected source");
                Outcome::Ok(None)
            }
            Err(fault) => Outcome::Faulted(fault),
        }
    }
}
