//! Claimdesk API Server
//!
//! Main entry point for the claim intake service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use claimdesk_api::{AppState, create_router};
use claimdesk_core::claim::{ClaimRepository, InMemoryClaimRepository};
use claimdesk_core::storage::{StorageConfig, StorageService};
use claimdesk_db::{ClaimRepository as PgClaimRepository, connect, migration::Migrator};
use claimdesk_shared::{AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let storage = StorageService::from_config(StorageConfig::from_settings(&config.storage))
        .context("Failed to initialize attachment storage")?;
    info!(
        provider = storage.provider_name(),
        max_file_size = config.storage.max_file_size,
        "Attachment storage configured"
    );
    let storage = Arc::new(storage);

    if config.database.is_in_memory() {
        warn!("Using in-memory claim store, claims are lost on restart");
        return serve(Arc::new(InMemoryClaimRepository::new()), storage, &config).await;
    }

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    serve(Arc::new(PgClaimRepository::new(db)), storage, &config).await
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve<R: ClaimRepository + 'static>(
    repo: Arc<R>,
    storage: Arc<StorageService>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let state = AppState::new(repo, storage);
    let app = create_router(state, config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
