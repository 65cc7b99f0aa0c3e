use std::net::SocketAddr;

// ── RED metrics (command-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "fleetd_commands_total";

// ── USE metrics (background work) ───────────────────────────────

/// Counter: overdue sweep passes completed.
pub const SWEEPS_TOTAL: &str = "fleetd_overdue_sweeps_total";

/// Histogram: overdue sweep duration in seconds.
pub const SWEEP_DURATION_SECONDS: &str = "fleetd_overdue_sweep_duration_seconds";

/// Gauge: rentals currently in Overdue status.
pub const OVERDUE_RENTALS: &str = "fleetd_overdue_rentals";

/// Histogram: snapshot rewrite duration in seconds.
pub const SNAPSHOT_WRITE_DURATION_SECONDS: &str = "fleetd_snapshot_write_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Record a command outcome at the public boundary and pass the result
/// through unchanged.
pub fn observe<T, E>(command: &'static str, result: Result<T, E>) -> Result<T, E> {
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(COMMANDS_TOTAL, "command" => command, "status" => status).increment(1);
    result
}
