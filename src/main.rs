use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use fleetd::engine::Engine;
use fleetd::monitor::OverdueMonitor;
use fleetd::notify::NotifyHub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("FLEETD_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    fleetd::observability::init(metrics_port);

    let data_dir = std::env::var("FLEETD_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let sweep_interval: u64 = std::env::var("FLEETD_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);

    let notify = Arc::new(NotifyHub::new());
    let engine = Arc::new(Engine::open(PathBuf::from(&data_dir), notify)?);
    let counts = engine.counts().await;

    info!("fleetd starting");
    info!("  data_dir: {data_dir}");
    info!("  sweep_interval: {sweep_interval}s");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );
    info!(
        "  loaded: {} customers, {} vehicles, {} rentals, {} reservations",
        counts.customers, counts.vehicles, counts.rentals, counts.reservations
    );

    let monitor = OverdueMonitor::start(engine.clone(), Duration::from_secs(sweep_interval));

    // Stop the sweep loop on SIGTERM/ctrl-c; an in-flight tick finishes first.
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    info!("shutdown signal received");
    monitor.stop().await;
    info!("fleetd stopped");
    Ok(())
}
