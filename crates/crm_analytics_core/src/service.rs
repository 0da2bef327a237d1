//! Resource services: one per record kind.
//!
//! Plain kinds save by id (replace when the row exists, insert otherwise).
//! Deal insights save through the stage merge instead.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::paging::{Page, PageRequest};
use crate::ports::{AnalyticsStores, DealInsightStore, RecordStore, Result};
use crate::types::{
    ActivityStat, DealInsight, DealInsightDraft, LeadAnalytics, OverviewMetric, Record, RecordId,
};

/// The operations the HTTP layer drives for one record kind.
#[async_trait]
pub trait ResourceService<R: Record>: Send + Sync {
    async fn find_all(&self) -> Result<Vec<R>>;

    async fn find_page(&self, request: PageRequest) -> Result<Page<R>>;

    async fn save(&self, draft: R::Draft) -> Result<R>;

    /// Not exposed over HTTP.
    async fn delete(&self, id: RecordId) -> Result<bool>;
}

fn check_sort<R: Record>(request: &PageRequest) -> Result<()> {
    match &request.sort {
        Some(sort) => sort.check_for::<R>(),
        None => Ok(()),
    }
}

// ── Plain store-backed service ────────────────────────────────

pub struct StoreService<R: Record> {
    store: Arc<dyn RecordStore<R>>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Record> StoreService<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> ResourceService<R> for StoreService<R> {
    async fn find_all(&self) -> Result<Vec<R>> {
        self.store.find_all().await
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<R>> {
        check_sort::<R>(&request)?;
        self.store.find_page(&request).await
    }

    async fn save(&self, draft: R::Draft) -> Result<R> {
        if let Some(id) = R::draft_id(&draft) {
            if let Some(replaced) = self.store.replace(R::from_draft(id, draft.clone())).await? {
                tracing::info!(kind = %R::KIND, id, "replaced record");
                return Ok(replaced);
            }
            tracing::debug!(kind = %R::KIND, id, "no row for submitted id, inserting");
        }
        let created = self.store.create(draft).await?;
        tracing::info!(kind = %R::KIND, id = created.id(), "created record");
        Ok(created)
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        let removed = self.store.delete_by_id(id).await?;
        if removed {
            tracing::info!(kind = %R::KIND, id, "deleted record");
        }
        Ok(removed)
    }
}

// ── Deal insights ─────────────────────────────────────────────

pub struct DealInsightService {
    store: Arc<dyn DealInsightStore>,
}

impl DealInsightService {
    pub fn new(store: Arc<dyn DealInsightStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_stage(&self, stage: &str) -> Result<Option<DealInsight>> {
        self.store.find_by_stage(stage).await
    }
}

#[async_trait]
impl ResourceService<DealInsight> for DealInsightService {
    async fn find_all(&self) -> Result<Vec<DealInsight>> {
        self.store.find_all().await
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<DealInsight>> {
        check_sort::<DealInsight>(&request)?;
        self.store.find_page(&request).await
    }

    async fn save(&self, draft: DealInsightDraft) -> Result<DealInsight> {
        let saved = self.store.merge_by_stage(draft).await?;
        tracing::info!(
            id = saved.id,
            stage = %saved.stage,
            count = saved.count,
            "saved deal insight"
        );
        Ok(saved)
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        self.store.delete_by_id(id).await
    }
}

/// All four services, cloned into the HTTP layer.
#[derive(Clone)]
pub struct AnalyticsServices {
    pub activity_stats: Arc<dyn ResourceService<ActivityStat>>,
    pub deal_insights: Arc<dyn ResourceService<DealInsight>>,
    pub lead_analytics: Arc<dyn ResourceService<LeadAnalytics>>,
    pub overview_metrics: Arc<dyn ResourceService<OverviewMetric>>,
}

impl AnalyticsServices {
    pub fn new(stores: AnalyticsStores) -> Self {
        Self {
            activity_stats: Arc::new(StoreService::new(stores.activity_stats)),
            deal_insights: Arc::new(DealInsightService::new(stores.deal_insights)),
            lead_analytics: Arc::new(StoreService::new(stores.lead_analytics)),
            overview_metrics: Arc::new(StoreService::new(stores.overview_metrics)),
        }
    }
}
