//! Metrics collection and exposition.
//!
//! # Metrics
//! - `slipway_listeners_bound_total` (counter): listeners bound by startups
//! - `slipway_startup_failures_total` (counter): failed startup attempts
//! - `slipway_uptime_seconds` (gauge): heartbeat-maintained uptime
//!
//! # Design Decisions
//! - Updates go through the `metrics` facade and are cheap no-ops until a
//!   recorder is installed
//! - The Prometheus endpoint is optional and bound only when enabled

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const LISTENERS_BOUND: &str = "slipway_listeners_bound_total";
pub const STARTUP_FAILURES: &str = "slipway_startup_failures_total";
pub const UPTIME_SECONDS: &str = "slipway_uptime_seconds";

/// Install the Prometheus recorder and exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(error) => tracing::error!(%error, "failed to install metrics exporter"),
    }
}
