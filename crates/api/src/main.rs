//! PBX Presence - headless sync service
//!
//! Loads configuration, runs startup discovery, then reconciles presence on a
//! timer until interrupted.

use anyhow::Context;
use pbxpresence_lib::utils::init_logging;
use pbxpresence_lib::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config loading reads `.env`, so logging comes up first to report it.
    init_logging();

    let config = pbxpresence_infra::load_config().context("failed to load configuration")?;
    let context = AppContext::new_with_config(config).context("failed to initialise service")?;

    context.start().await.context("failed to start sync scheduler")?;
    tracing::info!("PBX presence service running; press Ctrl+C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");

    context.shutdown().await.context("failed to stop cleanly")?;
    Ok(())
}
