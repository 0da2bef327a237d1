//! Postgres implementations of the crm_analytics_core port traits.
//!
//! Each store is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query_as, not sqlx::query_as!) to avoid a compile-time DB
//! requirement. Sort columns come from a fixed per-table mapping, never from
//! request text.

use std::marker::PhantomData;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgConnection, PgPool, Postgres};

use crm_analytics_core::error::CrmError;
use crm_analytics_core::merge::{self, MergePlan};
use crm_analytics_core::paging::{Direction, Page, PageRequest};
use crm_analytics_core::ports::{DealInsightStore, RecordStore, Result};
use crm_analytics_core::types::{DealInsight, DealInsightDraft, Record, RecordId};

use crate::sqlx_types::PgDealInsightRow;

/// Table layout of a record kind.
pub trait PgRecord: Record {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin + Into<Self>;

    /// Data columns in bind order, `id` excluded.
    const COLUMNS: &'static [&'static str];

    /// Column for a wire property name.
    fn column(property: &str) -> Option<&'static str>;

    /// Bind the draft's values in `COLUMNS` order.
    fn bind_draft<'q>(
        query: QueryAs<'q, Postgres, Self::Row, PgArguments>,
        draft: Self::Draft,
    ) -> QueryAs<'q, Postgres, Self::Row, PgArguments>;
}

/// Map sqlx failures: unique violations become conflicts, the rest internal.
pub(crate) fn db_err(e: sqlx::Error) -> CrmError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return CrmError::Conflict(db.message().to_string());
        }
    }
    CrmError::Internal(anyhow!(e))
}

fn select_list<R: PgRecord>() -> String {
    std::iter::once("id")
        .chain(R::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

fn order_clause<R: PgRecord>(request: &PageRequest) -> Result<String> {
    let Some(sort) = &request.sort else {
        return Ok("id ASC".to_string());
    };
    let column = R::column(&sort.property).ok_or_else(|| {
        CrmError::InvalidInput(format!("unknown sort property '{}'", sort.property))
    })?;
    // NULL placement matches the in-memory store (absent sorts lowest).
    let nulls = match sort.direction {
        Direction::Asc => "NULLS FIRST",
        Direction::Desc => "NULLS LAST",
    };
    Ok(format!("{column} {} {nulls}, id ASC", sort.direction.as_sql()))
}

// ── PgRecordStore ─────────────────────────────────────────────

/// Postgres-backed store for one record kind.
pub struct PgRecordStore<R> {
    pool: PgPool,
    _kind: PhantomData<fn() -> R>,
}

impl<R: PgRecord> PgRecordStore<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    fn table() -> &'static str {
        R::KIND.table()
    }
}

#[async_trait]
impl<R: PgRecord> RecordStore<R> for PgRecordStore<R> {
    async fn create(&self, draft: R::Draft) -> Result<R> {
        let placeholders = (1..=R::COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING {}",
            Self::table(),
            R::COLUMNS.join(", "),
            select_list::<R>()
        );
        let row = R::bind_draft(sqlx::query_as::<_, R::Row>(&sql), draft)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn replace(&self, record: R) -> Result<Option<R>> {
        let id = record.id();
        let assignments = R::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ${} RETURNING {}",
            Self::table(),
            R::COLUMNS.len() + 1,
            select_list::<R>()
        );
        let row = R::bind_draft(sqlx::query_as::<_, R::Row>(&sql), record.into_draft())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            select_list::<R>(),
            Self::table()
        );
        let row = sqlx::query_as::<_, R::Row>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id ASC",
            select_list::<R>(),
            Self::table()
        );
        let rows = sqlx::query_as::<_, R::Row>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<R>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
            select_list::<R>(),
            Self::table(),
            order_clause::<R>(request)?
        );
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, R::Row>(&sql)
            .bind(i64::from(request.size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let total = self.count().await?;
        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            request,
            total,
        ))
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::table());
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }
}

// ── PgDealInsightStore ────────────────────────────────────────

/// Deal insight store. Stage merges run in one transaction holding a row
/// lock on the stage, backed by the unique index on `deal_insights(stage)`.
pub struct PgDealInsightStore {
    pool: PgPool,
    records: PgRecordStore<DealInsight>,
}

impl PgDealInsightStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            records: PgRecordStore::new(pool.clone()),
            pool,
        }
    }

    async fn lock_stage(conn: &mut PgConnection, stage: &str) -> Result<Option<DealInsight>> {
        let row = sqlx::query_as::<_, PgDealInsightRow>(
            r#"
            SELECT id, stage, count, total_value
            FROM deal_insights
            WHERE stage = $1
            FOR UPDATE
            "#,
        )
        .bind(stage)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    /// Insert a new stage row unless a concurrent merge already created it.
    async fn try_insert(
        conn: &mut PgConnection,
        draft: DealInsightDraft,
    ) -> Result<Option<DealInsight>> {
        let row = sqlx::query_as::<_, PgDealInsightRow>(
            r#"
            INSERT INTO deal_insights (stage, count, total_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (stage) DO NOTHING
            RETURNING id, stage, count, total_value
            "#,
        )
        .bind(draft.stage)
        .bind(draft.count)
        .bind(draft.total_value)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn write_merged(conn: &mut PgConnection, merged: &DealInsight) -> Result<DealInsight> {
        let row = sqlx::query_as::<_, PgDealInsightRow>(
            r#"
            UPDATE deal_insights
            SET count = $1, total_value = $2
            WHERE id = $3
            RETURNING id, stage, count, total_value
            "#,
        )
        .bind(merged.count)
        .bind(merged.total_value)
        .bind(merged.id)
        .fetch_one(conn)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }
}

#[async_trait]
impl RecordStore<DealInsight> for PgDealInsightStore {
    async fn create(&self, draft: DealInsightDraft) -> Result<DealInsight> {
        self.records.create(draft).await
    }

    async fn replace(&self, record: DealInsight) -> Result<Option<DealInsight>> {
        self.records.replace(record).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<DealInsight>> {
        self.records.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<DealInsight>> {
        self.records.find_all().await
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<DealInsight>> {
        self.records.find_page(request).await
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        self.records.delete_by_id(id).await
    }

    async fn count(&self) -> Result<u64> {
        self.records.count().await
    }
}

#[async_trait]
impl DealInsightStore for PgDealInsightStore {
    async fn find_by_stage(&self, stage: &str) -> Result<Option<DealInsight>> {
        let row = sqlx::query_as::<_, PgDealInsightRow>(
            "SELECT id, stage, count, total_value FROM deal_insights WHERE stage = $1",
        )
        .bind(stage)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn merge_by_stage(&self, candidate: DealInsightDraft) -> Result<DealInsight> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let mut existing = Self::lock_stage(&mut tx, &candidate.stage).await?;
        if existing.is_none() {
            if let MergePlan::Insert(draft) = merge::plan(None, candidate.clone())? {
                if let Some(inserted) = Self::try_insert(&mut tx, draft).await? {
                    tx.commit().await.map_err(db_err)?;
                    tracing::debug!(id = inserted.id, stage = %inserted.stage, "inserted new stage");
                    return Ok(inserted);
                }
            }
            // Lost the insert race: the winner has committed, lock its row.
            existing = Self::lock_stage(&mut tx, &candidate.stage).await?;
        }

        let stage = candidate.stage.clone();
        match merge::plan(existing.as_ref(), candidate)? {
            MergePlan::Replace(merged) => {
                let saved = Self::write_merged(&mut tx, &merged).await?;
                tx.commit().await.map_err(db_err)?;
                tracing::debug!(id = saved.id, stage = %saved.stage, "merged into existing stage");
                Ok(saved)
            }
            MergePlan::Insert(_) => Err(CrmError::Internal(anyhow!(
                "stage '{stage}' neither insertable nor lockable"
            ))),
        }
    }
}
