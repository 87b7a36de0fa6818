//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alt_tong_requests_total` (counter): proxied requests by outcome
//! - `alt_tong_header_rewrites_total` (counter): Accept-Language rewrites
//! - `alt_tong_probe_total` (counter): default-language probes by outcome
//! - `alt_tong_reconfigure_total` (counter): reconfigurations by outcome
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! library users pay nothing unless `init_metrics` runs.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str) {
    counter!("alt_tong_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_header_rewrite() {
    counter!("alt_tong_header_rewrites_total").increment(1);
}

pub fn record_probe(outcome: &'static str) {
    counter!("alt_tong_probe_total", "outcome" => outcome).increment(1);
}

pub fn record_reconfigure(outcome: &'static str) {
    counter!("alt_tong_reconfigure_total", "outcome" => outcome).increment(1);
}
