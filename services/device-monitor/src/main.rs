//! Device Monitor CLI
//!
//! Command-line interface for the IoT device monitoring dashboard.

use std::path::PathBuf;

use clap::Parser;
use device_monitor::config::StoreBackend;
use device_monitor::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "device-monitor")]
#[command(about = "IoT device monitoring dashboard backed by a realtime data store")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device (house number) to monitor (overrides config file)
    #[arg(short, long)]
    device_id: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Use the in-memory store instead of the configured database
    #[arg(long)]
    demo: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, device_id={:?}, dashboard_port={:?}, demo={}, log_level={:?}",
        args.config,
        args.device_id,
        args.dashboard_port,
        args.demo,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(device_id) = args.device_id {
        config.device_id = device_id;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }
    if args.demo {
        config.store.backend = StoreBackend::Memory;
    }

    tracing::info!("Starting device monitor for device {}", config.device_id);
    tracing::debug!(
        "Store: {:?}, Notifiers: {}",
        config.store.backend,
        config.notifications.notifiers.len()
    );

    device_monitor::run(config).await?;

    Ok(())
}
