//! Waveforge Engine
//!
//! Offline audio engine service: accepts Edit Decision Lists over
//! HTTP, renders sample-accurate windows of the timeline to WAV, and
//! streams lifecycle events to subscribers.

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waveforge_engine::api;
use waveforge_engine::config::Config;
use waveforge_engine::EngineService;

/// Waveforge Engine - offline EDL rendering service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind to (overrides WAVEFORGE_HOST)
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Port to bind to (overrides WAVEFORGE_PORT)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("waveforge_engine={},waveforge_common={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Waveforge Engine starting...");

    let config = Config::resolve(args.host, args.port);

    let service = Arc::new(EngineService::new());

    info!("Starting HTTP server on {}...", config.bind_addr());
    api::start(&config, service).await?;

    Ok(())
}
