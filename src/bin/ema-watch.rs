//! emawatch service
//!
//! Serves the watchlist API and runs the crossover scheduler in one process.

use dotenvy::dotenv;
use emawatch::config::Config;
use emawatch::core::{ShutdownSignal, WatchRuntime};
use emawatch::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init_logging(config.log_format());

    info!("Starting emawatch");
    info!(environment = %config.environment, "Environment");
    info!(data_dir = %config.data_dir.display(), "Data directory");
    info!(
        interval = config.tick_interval.as_secs(),
        "Crossover check: every {} seconds",
        config.tick_interval.as_secs()
    );
    if config.api_key.is_none() {
        info!("API_KEY not set, /api routes are unauthenticated");
    }

    let signals = ShutdownSignal::install()?;
    let runtime = WatchRuntime::from_config(config)?;

    let shutdown = async move {
        signals.recv().await;
        info!("Shutting down...");
    };

    runtime.run(shutdown).await?;

    info!("emawatch stopped");
    Ok(())
}
