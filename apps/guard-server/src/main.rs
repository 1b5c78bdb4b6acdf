//! Standalone request gate serving the demo API surface.

mod config;
mod logging;
mod routes;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "guard-server",
    about = "Authentication and authorization gate for REST APIs",
    version
)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Override `gateway.bind_addr`
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter, e.g. `debug` or `api_gateway=debug,info` (default: `RUST_LOG`, then info)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        cfg.gateway.bind_addr = bind;
    }

    if cli.print_config {
        #[allow(clippy::print_stdout)]
        {
            println!("{}", config::render(&cfg)?);
        }
        return Ok(());
    }

    logging::init(cli.log_level.as_deref(), cli.json_logs)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting guard-server");

    let router = routes::router(&cfg)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown signal received");
                on_signal.cancel();
            }
            Err(e) => tracing::error!("failed to listen for shutdown signal: {e}"),
        }
    });

    api_gateway::serve(router, &cfg.gateway.bind_addr, cancel).await
}
