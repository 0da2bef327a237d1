//! Storage port traits.
//! Implemented by crm_analytics_postgres and by the in-memory store in
//! [`crate::memory`]; services depend only on these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CrmError;
use crate::paging::{Page, PageRequest};
use crate::types::{
    ActivityStat, DealInsight, DealInsightDraft, LeadAnalytics, OverviewMetric, Record, RecordId,
};

pub type Result<T> = std::result::Result<T, CrmError>;

/// Typed storage for one record kind.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Insert a new row. Any id carried by the draft is ignored.
    async fn create(&self, draft: R::Draft) -> Result<R>;

    /// Overwrite the row with `record.id()`. Returns `None` if no such row.
    async fn replace(&self, record: R) -> Result<Option<R>>;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>>;

    /// Every row, ascending by id.
    async fn find_all(&self) -> Result<Vec<R>>;

    /// One page. The sort property, if any, has already been checked
    /// against `R::SORTABLE`.
    async fn find_page(&self, request: &PageRequest) -> Result<Page<R>>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: RecordId) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}

/// Deal insights add a stage lookup and the atomic stage merge.
#[async_trait]
pub trait DealInsightStore: RecordStore<DealInsight> {
    /// Exact, case-sensitive stage match.
    async fn find_by_stage(&self, stage: &str) -> Result<Option<DealInsight>>;

    /// Look up the candidate's stage, apply [`crate::merge::plan`] and write
    /// the result, all as one atomic step with respect to other merges on the
    /// same stage.
    async fn merge_by_stage(&self, candidate: DealInsightDraft) -> Result<DealInsight>;
}

/// One store per record kind, as handed to the service layer.
#[derive(Clone)]
pub struct AnalyticsStores {
    pub activity_stats: Arc<dyn RecordStore<ActivityStat>>,
    pub deal_insights: Arc<dyn DealInsightStore>,
    pub lead_analytics: Arc<dyn RecordStore<LeadAnalytics>>,
    pub overview_metrics: Arc<dyn RecordStore<OverviewMetric>>,
}
