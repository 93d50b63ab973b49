//! Wire types of the remote compile-and-run service.

use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One timed output event of a remote run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    #[serde(rename = "Message")]
    pub message: String,

    /// Output stream ("stdout" / "stderr") when the service reports it.
    #[serde(rename = "Kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Delay before this event, as a Go duration (nanoseconds).
    #[serde(rename = "Delay", default)]
    pub delay: i64,
}

impl Event {
    pub fn delay(&self) -> Duration {
        Duration::from_nanos(self.delay.max(0) as u64)
    }
}

/// Outcome of a remote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The program compiled and ran; events are in emission order.
    Completed { events: Vec<Event> },
    /// The service reported a build or run error.
    Failed { errors: String },
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(rename = "Errors", default)]
    errors: Option<String>,
    #[serde(rename = "Events", default)]
    events: Option<Vec<Event>>,
}

/// A decoded response body, kept verbatim for forwarding to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResponse {
    body: Map<String, Value>,
    result: ExecutionResult,
}

impl CompileResponse {
    /// Decode a response body. The body must be a JSON object whose
    /// `Errors` and `Events` fields, when present, are well-formed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let body: Map<String, Value> = serde_json::from_slice(bytes)?;
        let wire: WireResult = serde_json::from_value(Value::Object(body.clone()))?;

        let result = match wire.errors {
            Some(errors) if !errors.is_empty() => ExecutionResult::Failed { errors },
            _ => ExecutionResult::Completed {
                events: wire.events.unwrap_or_default(),
            },
        };

        Ok(Self { body, result })
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// The body exactly as the service sent it.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

impl Serialize for CompileResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}
