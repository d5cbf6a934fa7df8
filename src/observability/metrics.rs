//! Metrics collection and exposition.
//!
//! # Metrics
//! - `intake_requests_total` (counter): submissions by outcome
//! - `intake_request_duration_seconds` (histogram): handler latency by outcome
//! - `intake_filename_collisions_total` (counter): names already taken while probing
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is opt-in and listens on its own address

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished submission.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("intake_requests_total", "outcome" => outcome, "status" => status)
        .increment(1);
    metrics::histogram!("intake_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record filenames skipped because they already existed.
pub fn record_collisions(count: u32) {
    if count > 0 {
        metrics::counter!("intake_filename_collisions_total").increment(u64::from(count));
    }
}
