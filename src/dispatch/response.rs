//! Outbound messages and error reports.

use serde::Serialize;

use crate::execution::{CompileResponse, ProxyError};
use crate::resilience::supervise::Fault;
use crate::toolchain::ToolchainError;

/// A message sent to the browser: `{"type": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Echo of the request `type`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `null` when the operation produced nothing (e.g. unformattable source).
    pub value: Option<ResponseValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    Execution(CompileResponse),
}

impl Response {
    pub fn new(kind: impl Into<String>, value: Option<ResponseValue>) -> Self {
        Self {
            kind: kind.into(),
            value,
        }
    }

    pub fn text(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(kind, Some(ResponseValue::Text(text.into())))
    }

    pub fn error(kind: impl Into<String>, report: ErrorReport) -> Self {
        Self::text(kind, report.to_string())
    }

    /// The value as text, if it is text.
    pub fn text_value(&self) -> Option<&str> {
        match &self.value {
            Some(ResponseValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

/// Diagnostics surfaced in place of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReport {
    Single(String),
    /// Independent diagnostics in the order the reporter produced them.
    List(Vec<String>),
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorReport::Single(message) => write!(f, "{}", message),
            ErrorReport::List(messages) => write!(f, "{}", messages.join("\n")),
        }
    }
}

impl From<ToolchainError> for ErrorReport {
    fn from(err: ToolchainError) -> Self {
        match err {
            ToolchainError::Diagnostics(messages) => ErrorReport::List(messages),
            other => ErrorReport::Single(other.to_string()),
        }
    }
}

impl From<ProxyError> for ErrorReport {
    fn from(err: ProxyError) -> Self {
        ErrorReport::Single(err.to_string())
    }
}

impl From<Fault> for ErrorReport {
    fn from(fault: Fault) -> Self {
        ErrorReport::Single(fault.to_string())
    }
}
