//! # UAV Telemetry
//!
//! Runs the simulated telemetry source and prints the dashboard to stdout.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (argument path, `config/default.toml`, or defaults)
//!    - Set up logging with tracing subscriber
//!    - Build the telemetry source from the baseline
//!
//! 2. **Main Loop**
//!    - Start the simulation (unless `autostart = false`)
//!    - Render every published snapshot until Ctrl+C
//!
//! 3. **Graceful Shutdown**
//!    - Stop the simulation
//!    - Log the number of frames rendered
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use uav_telemetry::config::Config;
use uav_telemetry::dashboard::{monitor, Dashboard, OutputFormat, Thresholds};
use uav_telemetry::telemetry::source::TelemetrySource;

/// Config file read when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

fn load_config(arg: Option<String>) -> Result<Config> {
    match arg {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("failed to load configuration from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let directive = level
        .to_lowercase()
        .parse::<tracing::Level>()
        .with_context(|| format!("invalid log level '{}'", level))?;

    // Logs go to stderr so stdout carries only dashboard frames
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.into()),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(std::env::args().nth(1))?;
    init_logging(&config.logging.level)?;

    info!("UAV Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let format: OutputFormat = config.dashboard.format.parse()?;
    let dashboard = Dashboard::new(Thresholds::from(&config.dashboard));
    let mut source = TelemetrySource::from_config(&config);

    if config.simulation.autostart {
        source.start_simulation();
    } else {
        info!("Autostart disabled, showing baseline only");
    }
    info!("Press Ctrl+C to exit");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => warn!("Failed to listen for Ctrl+C, shutting down: {}", e),
        }
        signal.cancel();
    });

    let mut stdout = std::io::stdout();
    let frames = monitor::run(&source, &dashboard, format, &mut stdout, shutdown).await?;

    source.stop_simulation();
    info!("Total frames rendered: {}", frames);

    Ok(())
}
