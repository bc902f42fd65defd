//! `faenad`: the slaughterhouse inspection server binary.
//!
//! Usage:
//!   faenad -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/faena/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use faena::service::FaenaService;
use faena::FaenaModule;
use faena_core::Module;
use tokio::signal;
use tracing::info;

use config::ServerConfig;

/// Faena server.
#[derive(Parser, Debug)]
#[command(name = "faenad", about = "Slaughterhouse inspection server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides the config file and the 0.0.0.0:8080 default).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let mut core_config = faena_core::ServiceConfig {
        data_dir: Some(data_dir),
        sqlite_path: server_config
            .storage
            .sqlite_path
            .as_ref()
            .map(std::path::PathBuf::from),
        ..Default::default()
    };
    if let Some(listen) = cli.listen.clone().or_else(|| server_config.server.listen.clone()) {
        core_config.listen = listen;
    }

    let sqlite_path = core_config.resolve_sqlite_path();
    let sql: Arc<dyn faena_sql::SQLStore> = Arc::new(
        faena_sql::SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("SQLite store opened at {}", sqlite_path.display());

    let service = Arc::new(
        FaenaService::new(sql).map_err(|e| anyhow::anyhow!("failed to initialize schema: {}", e))?,
    );
    bootstrap::seed_catalog(&service, &server_config)?;

    let faena_module = FaenaModule::new(Arc::clone(&service));
    info!("Faena module initialized");

    let module_routes = vec![(faena_module.name(), faena_module.routes())];
    let cors = routes::cors_layer(&server_config.server.cors_origins)?;
    let app = routes::build_router(module_routes, cors);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("Faena server listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
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
}
