//! crm_seed: bulk-load plausible analytics rows and report table counts.
//!
//!   crm_seed populate --per-table 100000
//!   crm_seed counts
//!
//! Deal submissions are folded per stage in memory with the same merge
//! policy the server uses, then written through the stage merge once per
//! stage, so the table ends up with one row per stage.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crm_analytics_core::merge::{self, MergePlan};
use crm_analytics_core::ports::{DealInsightStore, RecordStore};
use crm_analytics_core::types::*;
use crm_analytics_postgres::{connect, run_migrations, DatabaseConfig, PgStores};

const STAGES: &[&str] = &["Prospecting", "Negotiation", "Closed Won", "Closed Lost"];
const SOURCES: &[&str] = &["Website", "Referral", "Event", "Social Media", "Email Campaign"];
const METRICS: &[&str] = &[
    "Total Revenue",
    "Open Deals",
    "Closed Deals",
    "New Leads",
    "Active Users",
];

#[derive(Parser)]
#[command(name = "crm_seed", about = "Seed and inspect the CRM analytics tables")]
struct Cli {
    /// PostgreSQL URL (falls back to DATABASE_URL)
    #[arg(long, env = "CRM_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert random rows into every table
    Populate {
        /// Rows (or deal submissions) generated per table
        #[arg(long, default_value_t = 100_000)]
        per_table: u64,

        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the row count of every table
    Counts,
}

fn progress(kind: RecordKind, done: u64, total: u64) {
    let step = (total / 10).max(1);
    if done % step == 0 {
        tracing::info!("{kind}: {done}/{total}");
    }
}

/// Collapse submissions to one draft per stage, in stage order.
fn fold_by_stage(
    submissions: impl IntoIterator<Item = DealInsightDraft>,
) -> Result<Vec<DealInsightDraft>> {
    let mut by_stage: BTreeMap<String, DealInsight> = BTreeMap::new();
    for draft in submissions {
        let next = match merge::plan(by_stage.get(&draft.stage), draft)? {
            MergePlan::Insert(draft) => DealInsight::from_draft(0, draft),
            MergePlan::Replace(merged) => merged,
        };
        by_stage.insert(next.stage.clone(), next);
    }
    Ok(by_stage
        .into_values()
        .map(|folded| DealInsightDraft {
            id: None,
            ..folded.into_draft()
        })
        .collect())
}

async fn populate(stores: &PgStores, per_table: u64, rng: &mut StdRng) -> Result<()> {
    let today = Utc::now().date_naive();

    for i in 0..per_table {
        progress(RecordKind::ActivityStat, i, per_table);
        let day = today - Duration::days(rng.gen_range(0..730));
        stores
            .activity_stats
            .create(ActivityStatDraft {
                id: None,
                day: day.format("%Y-%m-%d").to_string(),
                calls: rng.gen_range(0..=20),
                emails: rng.gen_range(0..=20),
                meetings: rng.gen_range(0..=10),
            })
            .await?;
    }

    let deals = (0..per_table).map(|i| {
        progress(RecordKind::DealInsight, i, per_table);
        let stage = STAGES.choose(rng).copied().unwrap_or("Prospecting");
        DealInsightDraft {
            id: None,
            stage: stage.to_string(),
            count: rng.gen_range(1..=100),
            total_value: Some(Decimal::new(rng.gen_range(100_000..=10_000_000), 2)),
        }
    });
    for folded in fold_by_stage(deals)? {
        stores.deal_insights.merge_by_stage(folded).await?;
    }

    for i in 0..per_table {
        progress(RecordKind::LeadAnalytics, i, per_table);
        let source = SOURCES.choose(rng).copied().unwrap_or("Website");
        stores
            .lead_analytics
            .create(LeadAnalyticsDraft {
                id: None,
                source: source.to_string(),
                count: rng.gen_range(1..=100),
                conversion_rate: Some(Decimal::new(rng.gen_range(0..=10_000), 2)),
            })
            .await?;
    }

    for i in 0..per_table {
        progress(RecordKind::OverviewMetric, i, per_table);
        let title = METRICS.choose(rng).copied().unwrap_or("Total Revenue");
        stores
            .overview_metrics
            .create(OverviewMetricDraft {
                id: None,
                title: title.to_string(),
                value: rng.gen_range(1..=1_000_000).to_string(),
            })
            .await?;
    }

    Ok(())
}

async fn counts(stores: &PgStores) -> Result<()> {
    let rows = [
        (RecordKind::ActivityStat, stores.activity_stats.count().await?),
        (RecordKind::DealInsight, stores.deal_insights.count().await?),
        (RecordKind::LeadAnalytics, stores.lead_analytics.count().await?),
        (RecordKind::OverviewMetric, stores.overview_metrics.count().await?),
    ];
    println!("Data counts in each table:");
    println!("{}", "-".repeat(40));
    for (kind, count) in rows {
        println!("{:<20} {count:>12} records", kind.table());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crm_seed=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "postgresql://localhost:5432/crm".to_string());

    let pool = connect(&DatabaseConfig::new(database_url).with_max_connections(4))
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;
    let stores = PgStores::new(pool);

    match cli.command {
        Command::Populate { per_table, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            tracing::info!("Inserting {per_table} rows per table");
            populate(&stores, per_table, &mut rng).await?;
            tracing::info!("Done");
            counts(&stores).await?;
        }
        Command::Counts => counts(&stores).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(stage: &str, count: i64, total: Option<i64>) -> DealInsightDraft {
        DealInsightDraft {
            id: None,
            stage: stage.into(),
            count,
            total_value: total.map(Decimal::from),
        }
    }

    #[test]
    fn submissions_fold_to_one_draft_per_stage() {
        let folded = fold_by_stage(vec![
            deal("Negotiation", 5, Some(100)),
            deal("Closed Won", 1, None),
            deal("Negotiation", 3, Some(50)),
            deal("Closed Won", 2, Some(7)),
        ])
        .unwrap();
        assert_eq!(
            folded,
            vec![deal("Closed Won", 3, Some(7)), deal("Negotiation", 8, Some(150))]
        );
    }

    #[test]
    fn no_submissions_fold_to_nothing() {
        assert!(fold_by_stage(Vec::new()).unwrap().is_empty());
    }
}
