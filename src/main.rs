//! # CrewHub — team calendar/task/chat backend
//!
//! Boots the notification core: opens the SQLite stores, starts the
//! reminder scheduler (short sweeps + daily digests), and serves the
//! notification API over HTTP.
//!
//! Usage:
//!   crewhub                      # Start with ~/.crewhub/config.toml
//!   crewhub --port 9000          # Override the gateway port
//!   crewhub --db-path ./dev.db   # Override the database path

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crewhub_core::CrewHubConfig;
use crewhub_gateway::AppState;
use crewhub_notify::{Notifier, ReminderScheduler};
use crewhub_store::{DomainStore, NotificationStore};

#[derive(Parser)]
#[command(
    name = "crewhub",
    version,
    about = "📋 CrewHub — team calendar/task/chat backend"
)]
struct Cli {
    /// Config file path (default: ~/.crewhub/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Database path override
    #[arg(long)]
    db_path: Option<String>,

    /// Gateway host override
    #[arg(long)]
    host: Option<String>,

    /// Gateway port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "crewhub=debug,crewhub_store=debug,crewhub_notify=debug,crewhub_gateway=debug,tower_http=debug"
    } else {
        "crewhub=info,crewhub_store=info,crewhub_notify=info,crewhub_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Load config, then apply CLI overrides
    let mut config = match &cli.config {
        Some(path) => CrewHubConfig::load_from(Path::new(&expand_path(path)))?,
        None => CrewHubConfig::load()?,
    };
    if let Some(db_path) = &cli.db_path {
        config.database.path = db_path.clone();
    }
    if let Some(host) = &cli.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    // Open stores
    let db_path = PathBuf::from(expand_path(&config.database.path));
    let domain = Arc::new(DomainStore::open(&db_path)?);
    let store = Arc::new(NotificationStore::open(&db_path)?);
    tracing::info!("💾 Database ready at {}", db_path.display());

    // Start the reminder scheduler
    let notifier = Notifier::new(store.clone());
    let mut scheduler =
        ReminderScheduler::new(domain.clone(), notifier, config.reminders.clone());
    scheduler.start();

    // Serve the notification API until ctrl-c
    let state = Arc::new(AppState {
        gateway_config: config.gateway.clone(),
        store,
        start_time: std::time::Instant::now(),
    });
    tokio::select! {
        result = crewhub_gateway::serve(state) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("👋 Shutting down");
        }
    }

    scheduler.stop();
    Ok(())
}
