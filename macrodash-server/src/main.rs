//! MacroDash server binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use macrodash_server::{init_tracing, serve, DEFAULT_LOG_FILTER};
use macrodash_service::{Dashboard, DashboardConfig};

#[derive(Parser)]
#[command(name = "macrodash-server", about = "MacroDash dashboard HTTP server", version)]
struct Args {
    /// Path to the TOML config file (defaults to ./macrodash.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long, short)]
    port: Option<u16>,

    /// Serve deterministic synthetic series instead of calling providers
    #[arg(long)]
    synthetic: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_FILTER);

    let args = Args::parse();
    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    serve(Dashboard::new(config).with_synthetic(args.synthetic)).await
}
