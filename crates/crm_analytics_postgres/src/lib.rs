//! PostgreSQL adapter for crm_analytics_core.
//!
//! Provides connection pooling, the baseline migration, and one store per
//! record kind implementing the core port traits.

pub mod sqlx_types;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crm_analytics_core::ports::AnalyticsStores;
use crm_analytics_core::types::{ActivityStat, LeadAnalytics, OverviewMetric};

pub use store::{PgDealInsightStore, PgRecord, PgRecordStore};

/// Baseline schema, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Open a connection pool with the given configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "Connecting to database: {}",
        mask_database_url(&config.database_url)
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connection_timeout);

    if let Some(idle_timeout) = config.idle_timeout {
        pool_options = pool_options.idle_timeout(idle_timeout);
    }

    if let Some(max_lifetime) = config.max_lifetime {
        pool_options = pool_options.max_lifetime(max_lifetime);
    }

    let pool = pool_options
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            warn!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Apply pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!("Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database schema up to date");
    Ok(())
}

/// Postgres stores for all four record kinds.
pub struct PgStores {
    pub activity_stats: PgRecordStore<ActivityStat>,
    pub deal_insights: PgDealInsightStore,
    pub lead_analytics: PgRecordStore<LeadAnalytics>,
    pub overview_metrics: PgRecordStore<OverviewMetric>,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            activity_stats: PgRecordStore::new(pool.clone()),
            deal_insights: PgDealInsightStore::new(pool.clone()),
            lead_analytics: PgRecordStore::new(pool.clone()),
            overview_metrics: PgRecordStore::new(pool),
        }
    }

    /// Type-erase into the port bundle the services take.
    pub fn into_ports(self) -> AnalyticsStores {
        AnalyticsStores {
            activity_stats: Arc::new(self.activity_stats),
            deal_insights: Arc::new(self.deal_insights),
            lead_analytics: Arc::new(self.lead_analytics),
            overview_metrics: Arc::new(self.overview_metrics),
        }
    }
}

/// Database URL with any password replaced, safe to log. Unparseable input
/// is hidden entirely.
pub fn mask_database_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
