//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the playground server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the playground server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Listener configuration (bind address, TLS, connection limits).
    pub listener: ListenerConfig,

    /// Remote compile-and-run service settings.
    pub execution: ExecutionConfig,

    /// External translator and formatter commands.
    pub toolchain: ToolchainConfig,

    /// Dispatch queue monitoring.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5600").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrently open websocket connections.
    pub max_connections: usize,

    /// Largest inbound websocket message accepted, in bytes.
    pub max_message_bytes: usize,

    /// Timeout for plain HTTP requests (page, status) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5600".to_string(),
            tls: None,
            max_connections: 1024,
            max_message_bytes: 1024 * 1024, // 1MB
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Remote execution service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Compile endpoint receiving the form submission.
    pub endpoint: String,

    /// Protocol version tag sent as the `version` form field.
    pub version: String,

    /// Upper bound for one remote execution (connect, upload, response) in seconds.
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://play.golang.org/compile".to_string(),
            version: "2".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Commands backing the translator and formatter.
///
/// Each command is an argv list; the source is written to its stdin.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub translate_command: Vec<String>,

    /// Must understand SGo syntax; plain `gofmt` rejects SGo-only constructs.
    pub format_command: Vec<String>,

    /// Upper bound on one translate or format call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            translate_command: vec!["sgo".to_string(), "translate".to_string()],
            format_command: vec!["gofmt".to_string()],
            timeout_secs: 5,
        }
    }
}

/// Dispatch queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Queue depth at which a warning is logged. The queue itself is unbounded.
    pub queue_warn_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_warn_depth: 256,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
