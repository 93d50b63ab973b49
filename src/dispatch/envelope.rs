//! Inbound messages and the envelopes built from them.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::dispatch::writer::ConnectionHandle;

/// The operation a client asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Format,
    Translate,
    Execute,
    /// Any other `type`; the worker drops these without answering.
    Unrecognized(String),
}

impl RequestKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "format" => Self::Format,
            "translate" => Self::Translate,
            "execute" => Self::Execute,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire name, echoed back in the response `type`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Format => "format",
            Self::Translate => "translate",
            Self::Execute => "execute",
            Self::Unrecognized(name) => name,
        }
    }

    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Translate => "translate",
            Self::Execute => "execute",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// A message as sent by the browser: `{"type": ..., "value": ...}`.
///
/// A missing or `null` type decodes and is treated as unrecognized.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Value,
}

/// Source text carried by an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Source(String),
    /// The message had no usable source; holds the reason reported back.
    Malformed(String),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(source) => Self::Source(source),
            Value::Null => Self::Malformed("request value is missing; expected source text".to_string()),
            other => Self::Malformed(format!(
                "request value must be a string of source text, got {}",
                json_type_name(&other)
            )),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One unit of work for the worker, tagged with the connection it came from.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Correlates log lines of a single request.
    pub id: Uuid,
    pub kind: RequestKind,
    pub payload: Payload,
    pub origin: ConnectionHandle,
}

impl Envelope {
    pub fn new(kind: RequestKind, payload: Payload, origin: ConnectionHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            origin,
        }
    }

    pub fn from_message(message: ClientMessage, origin: ConnectionHandle) -> Self {
        let kind = RequestKind::parse(&message.kind.unwrap_or_default());
        Self::new(kind, Payload::from(message.value), origin)
    }
}
