//! filmflix-api - Film catalog REST service
//!
//! Serves films, actors and directors over HTTP and keeps their
//! cross-references in sync through a background outbox worker.

use anyhow::{Context, Result};
use clap::Parser;
use filmflix_common::catalog::Catalog;
use filmflix_common::config::{Config, ConfigOverrides};
use filmflix_common::db::init_database;
use filmflix_common::store::{DocumentStore, SqliteDocumentStore};
use filmflix_common::sync::{Outbox, SyncWorker, Synchronizer};
use filmflix_api::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments; each overrides the environment and config file
#[derive(Debug, Parser)]
#[command(name = "filmflix-api", version, about = "Film catalog REST service")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Admin key required for mutating requests
    #[arg(long)]
    admin_key: Option<String>,

    /// Directory of static files served outside /api
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config,
            port: self.port,
            database_path: self.database,
            admin_key: self.admin_key,
            static_dir: self.static_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_source) =
        Config::resolve(&cli.overrides()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Build identification first, before any database delay
    info!(
        "Starting Filmflix API (filmflix-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No config file found, using defaults and environment"),
    }
    if config.admin_key.is_none() {
        warn!("No admin key configured: all mutating requests will be rejected");
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool.clone()));
    let outbox = Outbox::new(pool.clone());
    let catalog = Catalog::new(store, outbox.clone())
        .with_patch_validation(config.validate_patch_references);

    let status = outbox.status().await?;
    if status.pending > 0 || status.dead > 0 {
        info!(
            pending = status.pending,
            dead = status.dead,
            "Resuming sync outbox"
        );
    }

    let shutdown = CancellationToken::new();
    let worker = SyncWorker::new(
        Synchronizer::new(catalog.repositories().clone()),
        outbox,
        config.sync.clone(),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    let state = AppState::new(catalog, config.admin_key.clone())
        .with_static_dir(config.static_dir.clone());
    let app = build_router(state);

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("filmflix-api listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining sync outbox");
    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        warn!("Sync worker ended abnormally: {}", e);
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
