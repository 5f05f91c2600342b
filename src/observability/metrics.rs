//! Metrics collection and exposition.
//!
//! # Metrics
//! - `qblog_api_attempts_total` (counter): attempts by operation, tier, outcome
//! - `qblog_session_transitions_total` (counter): session state entered
//! - `qblog_mock_requests_total` (counter): mock API requests by method, status

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::resilience::Tier;
use crate::session::SessionState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(operation: &'static str, tier: Tier, outcome: &'static str) {
    counter!(
        "qblog_api_attempts_total",
        "operation" => operation,
        "tier" => tier.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_session_transition(to: SessionState) {
    counter!("qblog_session_transitions_total", "to" => to.as_str()).increment(1);
}

pub fn record_mock_request(method: &str, status: u16) {
    counter!(
        "qblog_mock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
