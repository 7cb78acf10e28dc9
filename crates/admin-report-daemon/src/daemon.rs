use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use crate::config::{DaemonConfig, DatabaseConfig};
use crate::reports::ReportGenerator;
use crate::server::{AppState, ReportServer};
use admin_report_db::{Database, HabitsReportStore, TasksReportStore};

/// Open the report database and make sure both report tables exist.
///
/// Any failure here is fatal: the service cannot run without its stores.
pub async fn initialize_database(
    config: &DatabaseConfig,
) -> Result<(Database, HabitsReportStore, TasksReportStore)> {
    info!("Initializing database");

    let database = Database::new(admin_report_db::DatabaseConfig { path: config.path.clone() })
        .await
        .context("Failed to connect to database")?;

    let habits_store =
        HabitsReportStore::open(&database).await.context("Failed to prepare habits reports")?;
    let tasks_store =
        TasksReportStore::open(&database).await.context("Failed to prepare tasks reports")?;

    info!("Database initialized successfully");
    Ok((database, habits_store, tasks_store))
}

pub async fn run(config: DaemonConfig) -> Result<()> {
    let (mut database, habits_store, tasks_store) = initialize_database(&config.database).await?;

    let generator = ReportGenerator::from_config(&config.sources)?;

    let state = AppState {
        generator,
        habits_store: habits_store.clone(),
        tasks_store: tasks_store.clone(),
    };
    let server = ReportServer::bind(&config.server.bind_address, config.server.port, state).await?;

    info!("Admin report service running, waiting for shutdown signal...");

    let served = server.serve_until(shutdown_signal()).await;
    if let Err(e) = &served {
        warn!("Report server stopped with error: {}", e);
    }

    habits_store.close().await;
    tasks_store.close().await;
    database.close().await;

    info!("Admin report service shutdown complete");
    served
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let (mut sigterm, mut sigint) = match (
            signal::unix::signal(signal::unix::SignalKind::terminate()),
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                warn!("Could not install signal handlers, waiting for Ctrl+C only");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
