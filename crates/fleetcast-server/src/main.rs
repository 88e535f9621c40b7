//! fleetcast - real-time vehicle position hub
//!
//! Serves the WebSocket feed at `/ws` and drives simulated vehicles
//! started through `/api/simulations`.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Real-time vehicle position hub
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FLEETCAST_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = fleetcast_server::AppConfig::load(args.config)?;

    fleetcast_telemetry::init_logging(
        &config.telemetry.log_level,
        config.telemetry.log_format()?,
    )?;

    info!("Starting fleetcast v{}", env!("CARGO_PKG_VERSION"));
    info!(source = %source, bind_addr = %config.server.bind_addr, "Configuration loaded");

    let app = fleetcast_server::Application::new(config)?;
    app.run().await?;

    Ok(())
}
