//! Execute handler: translate, then run remotely.

use crate::dispatch::response::{ErrorReport, ResponseValue};
use crate::execution::ExecutionResult;
use crate::handlers::{Handlers, Outcome};
use crate::resilience::supervise::Supervised;

impl Handlers {
    /// Translate `source` and run the result on the execution service.
    ///
    /// The service is not contacted when translation fails.
    pub async fn execute(&self, source: String) -> Outcome {
        let translated = match self.translate_source(&source).await {
            Ok(Ok(translated)) => translated,
            Ok(Err(e)) => return Outcome::Rejected(ErrorReport::from(e)),
            Err(fault) => return Outcome::Faulted(fault),
        };

        match Supervised::new(self.proxy.execute(&translated)).await {
            Ok(Ok(response)) => {
                match response.result() {
                    ExecutionResult::Completed { events } => {
                        tracing::debug!(events = events.len(), "Program ran")
                    }
                    ExecutionResult::Failed { errors } => {
                        tracing::debug!(errors = %errors, "Program failed to build or run")
                    }
                }
                Outcome::Ok(Some(ResponseValue::Execution(response)))
            }
            Ok(Err(e)) => Outcome::Rejected(ErrorReport::from(e)),
            Err(fault) => Outcome::Faulted(fault),
        }
    }
}
