//! Outbound client to the remote compile-and-run service.
//!
//! # Responsibilities
//! - Submit translated source as a form (`version`, `body`)
//! - Decode the JSON result
//! - Bound every call with a timeout
//!
//! # Design Decisions
//! - No retries: a failure is reported to the client, who may resubmit
//! - No caching: every call reaches the service

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::config::ExecutionConfig;
use crate::execution::types::CompileResponse;
use crate::observability::metrics;

/// Errors talking to the execution service.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid execution endpoint '{0}': {1}")]
    InvalidEndpoint(String, url::ParseError),

    #[error("execution request timed out after {0} seconds")]
    Timeout(u64),

    #[error("execution request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed execution response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the execution service.
#[derive(Clone)]
pub struct ExecutionProxy {
    client: reqwest::Client,
    endpoint: Url,
    version: String,
    timeout_secs: u64,
}

impl ExecutionProxy {
    pub fn new(config: &ExecutionConfig) -> Result<Self, ProxyError> {
        let endpoint = config
            .endpoint
            .parse()
            .map_err(|e| ProxyError::InvalidEndpoint(config.endpoint.clone(), e))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            version: config.version.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Run translated source remotely.
    pub async fn execute(&self, source: &str) -> Result<CompileResponse, ProxyError> {
        let start = Instant::now();
        let result = match timeout(Duration::from_secs(self.timeout_secs), self.submit(source)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::Timeout(self.timeout_secs)),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ProxyError::Timeout(_)) => "timeout",
            Err(ProxyError::Decode(_)) => "decode_error",
            Err(_) => "transport_error",
        };
        metrics::record_remote_call(outcome);

        match &result {
            Ok(_) => tracing::debug!(
                endpoint = %self.endpoint,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Remote execution finished"
            ),
            Err(e) => tracing::warn!(endpoint = %self.endpoint, error = %e, "Remote execution failed"),
        }

        result
    }

    async fn submit(&self, source: &str) -> Result<CompileResponse, ProxyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("version", self.version.as_str()), ("body", source)])
            .send()
            .await?;

        let bytes = response.bytes().await?;
        Ok(CompileResponse::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for ExecutionProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionProxy")
            .field("endpoint", &self.endpoint.as_str())
            .field("version", &self.version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
