//! csvboard Relay Server
//!
//! Run with: cargo run --bin csvboard-relay
//!
//! # Configuration
//!
//! Read from `--config`, `<config dir>/csvboard/config.toml` or
//! `./csvboard.toml`, then overridden by environment variables:
//! - `BACKEND_URL`: Upstream base URL (required for relaying)
//! - `CSVBOARD_RELAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `CSVBOARD_RELAY_PORT` / `PORT`: Port to listen on (default: 8888)
//! - `CSVBOARD_LOG_LEVEL`, `CSVBOARD_LOG_FORMAT`, `RUST_LOG`: Logging

use anyhow::Context;
use clap::Parser;
use csvboard::config::Config;
use csvboard::relay::{serve, RelayState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvboard-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Forward the public function prefix to the CSV backend")]
struct Args {
    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::resolve_logged(args.config.as_deref())?;
    config.logging.init_tracing();

    tracing::info!("Starting csvboard relay v{}", env!("CARGO_PKG_VERSION"));

    let relay = &config.relay;
    if let Some(url) = &relay.backend_url {
        tracing::info!("Backend: {}", url);
    }
    tracing::info!("Public prefix: {}", relay.public_prefix);

    let state = RelayState::from_config(relay).context("failed to build relay HTTP client")?;

    let addr = format!("{}:{}", relay.host, relay.port);
    serve(state, &addr).await?;

    tracing::info!("csvboard relay stopped");
    Ok(())
}
