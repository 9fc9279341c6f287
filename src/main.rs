use anyhow::Context;
use rusty_lending_ledger::{
    adapters::{
        mock::MemoryStore,
        postgres::{MIGRATOR, PostgresCatalog, PostgresLedgerStore},
    },
    api::{handlers::AppState, router::create_router},
    application::ServiceDependencies,
    config::{AppConfig, StorageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service_deps = build_dependencies(&config).await?;

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, backend = ?config.storage.backend, "Server listening");

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wire the configured storage backend into the service dependencies
async fn build_dependencies(config: &AppConfig) -> anyhow::Result<ServiceDependencies> {
    let policy = config.lending_policy();

    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;

            if config.database.run_migrations {
                MIGRATOR
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
            }

            Ok(ServiceDependencies {
                ledger_store: Arc::new(PostgresLedgerStore::new(pool.clone())),
                catalog: Arc::new(PostgresCatalog::new(pool)),
                policy,
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            let store = MemoryStore::new();

            Ok(ServiceDependencies {
                ledger_store: Arc::new(store.clone()),
                catalog: Arc::new(store),
                policy,
            })
        }
    }
}

/// Resolve on Ctrl-C so in-flight requests finish before exit
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
