//! Vital Signs Monitoring Engine - Main Entry Point

use engine::{init_logging, Engine, EngineConfig};
use tokio::sync::watch;
use tracing::{info, warn};
use vitals::SimulatedSensor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== EdgePulse Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting vital signs monitoring engine...");

    let config_path = std::env::args().nth(1);
    let config = EngineConfig::load(config_path.as_deref())?;

    let engine = Engine::new(config, Box::new(SimulatedSensor::new()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    engine.run(shutdown_rx).await?;

    Ok(())
}
