//! Alert Relay - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("=== Alert Relay v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Store: {:?}, notifier: {:?}, queue capacity: {}",
        config.store.backend, config.notifier.kind, config.dispatch.queue_capacity
    );

    run_server(config).await?;

    Ok(())
}
