//! healthrelay - a minimal HTTP health check relay
//!
//! Usage:
//!     healthrelay [--config <path>] [--preset <preset>]
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use healthrelay::config::{apply_env_overrides, load_config, Config, RelayPreset};
use healthrelay::metrics::{MetricsCollector, MetricsServer};
use healthrelay::relay::{Relay, RelaySettings};
use healthrelay::server::RelayListener;
use healthrelay::util::{init_logging, ShutdownSignal};

/// Relays a health check to an external target on every request.
#[derive(Parser, Debug)]
#[command(name = "healthrelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Override the relay preset
    #[arg(short, long, value_enum)]
    preset: Option<RelayPreset>,

    /// Override the listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => Config::default(),
    };

    if let Some(preset) = cli.preset {
        config.relay.preset = preset;
    }
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())
        .context("invalid configuration after environment overrides")?;

    // CLI overrides config
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.global.log_level);

    init_logging(log_level, &config.global.log_format);

    let settings = config
        .relay
        .resolve()
        .context("failed to resolve relay target")?;

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Listen: {}", config.server.listen);
        println!("  Preset: {:?}", config.relay.preset);
        println!("  Target: {} ({})", settings.target, settings.target.url());
        println!("  Timeout: {}", humantime::format_duration(settings.timeout));
        println!("  Connection reuse: {:?}", settings.connection_reuse);
        println!("  Parse payload: {}", settings.parse_payload);
        println!("  Failure status: {}", settings.failure_status.as_u16());
        return Ok(());
    }

    info!(
        config_path = ?cli.config,
        listen = %config.server.listen,
        preset = ?config.relay.preset,
        upstream = %settings.target,
        "healthrelay starting"
    );

    run(config, settings)
}

/// Run the relay with the given configuration.
fn run(config: Config, settings: RelaySettings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config, settings).await })
}

/// Async entry point for the relay.
async fn run_async(config: Config, settings: RelaySettings) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    let metrics = MetricsCollector::new();

    let relay = Arc::new(Relay::new(settings).context("failed to initialize relay")?);

    let listener = RelayListener::bind(config.server.listen, relay, metrics.clone())
        .await
        .with_context(|| format!("failed to bind relay listener on {}", config.server.listen))?;

    let mut handles = Vec::new();

    let shutdown_rx = shutdown.subscribe();
    handles.push(tokio::spawn(async move {
        listener.run(shutdown_rx).await;
    }));

    let metrics_config = &config.global.metrics;
    if metrics_config.enabled {
        let server = MetricsServer::bind(metrics_config.address, metrics_config.path.clone(), metrics)
            .await
            .with_context(|| {
                format!("failed to bind metrics server on {}", metrics_config.address)
            })?;

        let shutdown_rx = shutdown.subscribe();
        handles.push(tokio::spawn(async move {
            server.run(shutdown_rx).await;
        }));
    }

    info!("healthrelay is running");
    info!("press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received shutdown signal");
        }
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    }

    shutdown.shutdown();

    for handle in handles {
        let _ = handle.await;
    }

    info!("healthrelay shut down complete");
    Ok(())
}
