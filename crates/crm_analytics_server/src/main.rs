//! crm_analytics_server - REST server for the CRM analytics dashboard.
//!
//! See `config` for the environment variables it reads.

use anyhow::{Context, Result};
use crm_analytics_core::memory::memory_stores;
use crm_analytics_core::AnalyticsServices;
use crm_analytics_postgres::{connect, mask_database_url, run_migrations, DatabaseConfig, PgStores};
use crm_analytics_server::config::{ServerConfig, StoreBackend};
use crm_analytics_server::router::build_router;
use tokio::net::TcpListener;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crm_analytics_server=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let stores = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            memory_stores()
        }
        StoreBackend::Postgres => {
            let db = DatabaseConfig::new(config.database_url.clone())
                .with_max_connections(config.max_connections);
            let pool = connect(&db).await.with_context(|| {
                format!(
                    "failed to connect to {}",
                    mask_database_url(&config.database_url)
                )
            })?;
            if config.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
            }
            PgStores::new(pool).into_ports()
        }
    };

    let app = build_router(AnalyticsServices::new(stores), config.cors_origins);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("crm_analytics_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
