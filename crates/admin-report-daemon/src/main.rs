use std::path::PathBuf;

use admin_report_daemon::config::DaemonConfig;
use admin_report_daemon::daemon;
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "admin-report-daemon")]
#[command(about = "Generates, stores and serves habits and tasks reports")]
struct Args {
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    bind_address: Option<String>,

    #[arg(short, long)]
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    info!("Starting admin report daemon");

    let mut config = match &args.config_path {
        Some(path) => DaemonConfig::load_from_path(path)?,
        None => DaemonConfig::load()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind_address) = args.bind_address {
        config.server.bind_address = bind_address;
    }
    config.apply_env_overrides();
    config.validate()?;

    info!("Report server will bind to {}:{}", config.server.bind_address, config.server.port);

    if let Err(e) = daemon::run(config).await {
        error!("Daemon error: {}", e);
        return Err(e);
    }

    info!("Admin report daemon stopped");
    Ok(())
}
