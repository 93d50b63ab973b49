//! Metrics collection and exposition.
//!
//! # Metrics
//! - `playground_requests_total` (counter): dispatched requests by kind, outcome
//! - `playground_request_duration_seconds` (histogram): handler latency by kind
//! - `playground_faults_total` (counter): supervised panics by kind
//! - `playground_active_connections` (gauge): open websocket connections
//! - `playground_queue_depth` (gauge): envelopes waiting for the worker
//! - `playground_remote_calls_total` (counter): execution service calls by outcome
//!
//! Recording is a no-op until a recorder is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed dispatch.
pub fn record_request(kind: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!("playground_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
    metrics::histogram!("playground_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

/// Record a panic intercepted by the failure boundary.
pub fn record_fault(kind: &'static str) {
    metrics::counter!("playground_faults_total", "kind" => kind).increment(1);
}

/// Record one call to the remote execution service.
pub fn record_remote_call(outcome: &'static str) {
    metrics::counter!("playground_remote_calls_total", "outcome" => outcome).increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("playground_active_connections").set(count as f64);
}

pub fn queue_entered() {
    metrics::gauge!("playground_queue_depth").increment(1.0);
}

pub fn queue_left() {
    metrics::gauge!("playground_queue_depth").decrement(1.0);
}
