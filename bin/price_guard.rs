//! # Price Guard Runner
//!
//! Computes the configured feed's price once and prints the `currentPrice` JSON-RPC
//! response, or keeps doing so on an interval.
//!
//! ## Overview
//!
//! In interval mode, settings are re-read on every tick and swapped into the running
//! service, so endpoint lists and limits can change without a restart.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin price_guard -- --config Config.toml
//! cargo run --bin price_guard -- --interval-secs 30
//! ```
//!
//! Environment overrides (`ETH_RPCS`, `BATOM_PRICE_LIMITS`, ...) are read from the
//! process environment and from `.env`. Press Ctrl+C to stop in interval mode.

use anyhow::{Context, Result};
use clap::Parser;
use price_guard::{OracleConfig, PriceFeedService, Settings};
use serde_json::Value;
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; defaults to `Config.toml` in the working directory if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recompute the price every N seconds instead of once.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Address for the Prometheus exporter (requires the `observability` feature).
    #[arg(long)]
    metrics_addr: Option<std::net::SocketAddr>,
}

fn load_config(args: &Args) -> Result<OracleConfig> {
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::new().context("failed to load settings")?,
    };
    Ok(OracleConfig::from_settings(&settings)?)
}

async fn print_price(service: &PriceFeedService, id: u64) -> Result<()> {
    let response = service.current_price_response(Value::from(id)).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    env_logger::init();

    let args = Args::parse();

    #[cfg(feature = "observability")]
    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        price_guard::metrics::describe_metrics();
        log::info!("Prometheus exporter listening on {}", addr);
    }
    #[cfg(not(feature = "observability"))]
    if args.metrics_addr.is_some() {
        log::warn!("--metrics-addr ignored: built without the observability feature");
    }

    let service = PriceFeedService::new(load_config(&args)?);

    let Some(every) = args.interval_secs else {
        return print_price(&service, 1).await;
    };

    log::info!("Computing {} price every {}s", service.config().source.name(), every);
    let mut ticker = interval(Duration::from_secs(every.max(1)));
    let mut id = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                id += 1;
                // Keep the previous configuration if the new one is invalid.
                if id > 1 {
                    match load_config(&args) {
                        Ok(config) => service.reconfigure(config),
                        Err(e) => log::error!("Settings reload failed, keeping previous config: {:#}", e),
                    }
                }
                print_price(&service, id).await?;
            }
            _ = signal::ctrl_c() => {
                log::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}
