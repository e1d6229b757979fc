use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use budget_police::config;
use budget_police::telemetry::{LogFormat, init_tracing};
use budget_police::{build_enforcer, router, serve};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "budget-police")]
#[command(about = "Detaches billing from sandbox projects that exceed their budget")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Log output format (`text` or `json`)
    #[arg(long, env = "BUDGET_POLICE_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = config::from_env().context("invalid configuration")?;
    let enforcer = build_enforcer(&config).context("failed to build service clients")?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, router(enforcer)).await?;
    info!("budget enforcer stopped");
    Ok(())
}
