//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resource_client_requests_total` (counter): operations by kind and outcome
//! - `resource_client_request_duration_seconds` (histogram): latency including retries
//! - `resource_client_retries_total` (counter): retries by operation kind
//! - `resource_client_cache_size` (gauge): records currently cached
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::client::operation::OperationKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a resolved operation.
pub fn record_request(kind: OperationKind, outcome: &'static str, start_time: Instant) {
    counter!(
        "resource_client_requests_total",
        "operation" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "resource_client_request_duration_seconds",
        "operation" => kind.as_str()
    )
    .record(start_time.elapsed().as_secs_f64());
}

pub fn record_retry(kind: OperationKind) {
    counter!("resource_client_retries_total", "operation" => kind.as_str()).increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("resource_client_cache_size").set(size as f64);
}
