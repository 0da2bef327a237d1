//! In-memory implementation of the storage ports.
//!
//! Rows live in a `tokio::sync::RwLock<BTreeMap<RecordId, R>>`, so iteration
//! is ascending by id like the Postgres adapter. Used by the HTTP tests and by
//! the server when `CRM_STORE=memory`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::merge::{self, MergePlan};
use crate::paging::{Direction, Page, PageRequest};
use crate::ports::{AnalyticsStores, DealInsightStore, RecordStore, Result};
use crate::types::{DealInsight, DealInsightDraft, Record, RecordId};

pub struct MemoryRecordStore<R: Record> {
    rows: RwLock<BTreeMap<RecordId, R>>,
    next_id: AtomicI64,
}

impl<R: Record> Default for MemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, AtomicOrdering::Relaxed)
    }

    fn insert_locked(&self, rows: &mut BTreeMap<RecordId, R>, draft: R::Draft) -> R {
        let record = R::from_draft(self.allocate_id(), draft);
        rows.insert(record.id(), record.clone());
        record
    }
}

fn compare<R: Record>(a: &R, b: &R, property: &str, direction: Direction) -> Ordering {
    let ord = a.sort_value(property).cmp(&b.sort_value(property));
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryRecordStore<R> {
    async fn create(&self, draft: R::Draft) -> Result<R> {
        let mut rows = self.rows.write().await;
        Ok(self.insert_locked(&mut rows, draft))
    }

    async fn replace(&self, record: R) -> Result<Option<R>> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<R>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<R>> {
        let rows = self.rows.read().await;
        let total = rows.len() as u64;
        let mut ordered: Vec<&R> = rows.values().collect();
        if let Some(sort) = &request.sort {
            // stable sort keeps ascending id as the tie-break
            ordered.sort_by(|a, b| compare(*a, *b, &sort.property, sort.direction));
        }
        let content = ordered
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, request, total))
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }
}

/// Deal insight store; merges happen under the write lock.
#[derive(Default)]
pub struct MemoryDealInsightStore {
    inner: MemoryRecordStore<DealInsight>,
}

impl MemoryDealInsightStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore<DealInsight> for MemoryDealInsightStore {
    async fn create(&self, draft: DealInsightDraft) -> Result<DealInsight> {
        self.inner.create(draft).await
    }

    async fn replace(&self, record: DealInsight) -> Result<Option<DealInsight>> {
        self.inner.replace(record).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<DealInsight>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<DealInsight>> {
        self.inner.find_all().await
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<DealInsight>> {
        self.inner.find_page(request).await
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        self.inner.delete_by_id(id).await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }
}

#[async_trait]
impl DealInsightStore for MemoryDealInsightStore {
    async fn find_by_stage(&self, stage: &str) -> Result<Option<DealInsight>> {
        let rows = self.inner.rows.read().await;
        Ok(rows.values().find(|d| d.stage == stage).cloned())
    }

    async fn merge_by_stage(&self, candidate: DealInsightDraft) -> Result<DealInsight> {
        let mut rows = self.inner.rows.write().await;
        let existing = rows.values().find(|d| d.stage == candidate.stage);
        match merge::plan(existing, candidate)? {
            MergePlan::Insert(draft) => Ok(self.inner.insert_locked(&mut rows, draft)),
            MergePlan::Replace(merged) => {
                rows.insert(merged.id, merged.clone());
                Ok(merged)
            }
        }
    }
}

/// Fresh, empty in-memory stores for all four kinds.
pub fn memory_stores() -> AnalyticsStores {
    AnalyticsStores {
        activity_stats: Arc::new(MemoryRecordStore::new()),
        deal_insights: Arc::new(MemoryDealInsightStore::new()),
        lead_analytics: Arc::new(MemoryRecordStore::new()),
        overview_metrics: Arc::new(MemoryRecordStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::Sort;
    use crate::types::{ActivityStat, ActivityStatDraft};

    fn stat(day: &str, calls: i32) -> ActivityStatDraft {
        ActivityStatDraft {
            id: None,
            day: day.into(),
            calls,
            emails: 0,
            meetings: 0,
        }
    }

    fn deal(stage: &str, count: i64, total: Option<&str>) -> DealInsightDraft {
        DealInsightDraft {
            id: None,
            stage: stage.into(),
            count,
            total_value: total.map(|t| t.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn pages_of_ten_over_twenty_five_rows() {
        let store = MemoryRecordStore::<ActivityStat>::new();
        for i in 0..25 {
            store.create(stat(&format!("day-{i}"), i)).await.unwrap();
        }

        let sizes: Vec<usize> = {
            let mut sizes = Vec::new();
            for page in 0..3 {
                let p = store.find_page(&PageRequest::new(page, 10)).await.unwrap();
                assert_eq!(p.total_elements, 25);
                assert_eq!(p.total_pages(), 3);
                sizes.push(p.content.len());
            }
            sizes
        };
        assert_eq!(sizes, vec![10, 10, 5]);

        let beyond = store.find_page(&PageRequest::new(3, 10)).await.unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 25);
    }

    #[tokio::test]
    async fn pages_follow_id_order_without_sort() {
        let store = MemoryRecordStore::<ActivityStat>::new();
        for i in 0..5 {
            store.create(stat("Mon", i)).await.unwrap();
        }
        let page = store.find_page(&PageRequest::new(1, 2)).await.unwrap();
        let ids: Vec<_> = page.content.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn sorted_page_descending() {
        let store = MemoryRecordStore::<ActivityStat>::new();
        for calls in [4, 9, 1, 9] {
            store.create(stat("Wed", calls)).await.unwrap();
        }
        let req = PageRequest::new(0, 10).with_sort(Sort::desc("calls"));
        let page = store.find_page(&req).await.unwrap();
        let calls: Vec<_> = page.content.iter().map(|s| (s.calls, s.id)).collect();
        assert_eq!(calls, vec![(9, 2), (9, 4), (4, 1), (1, 3)]);
    }

    #[tokio::test]
    async fn replace_missing_row_is_none() {
        let store = MemoryRecordStore::<ActivityStat>::new();
        let ghost = ActivityStat::from_draft(77, stat("Fri", 1));
        assert_eq!(store.replace(ghost).await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stage_match_is_case_sensitive() {
        let store = MemoryDealInsightStore::new();
        let upper = store.merge_by_stage(deal("Closed", 1, None)).await.unwrap();
        let lower = store.merge_by_stage(deal("closed", 1, None)).await.unwrap();
        assert_ne!(upper.id, lower.id);
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store.find_by_stage("CLOSED").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_totals_propagate_through_merges() {
        let store = MemoryDealInsightStore::new();
        store.merge_by_stage(deal("Qualified", 2, None)).await.unwrap();
        let still_null = store.merge_by_stage(deal("Qualified", 1, None)).await.unwrap();
        assert_eq!(still_null.count, 3);
        assert_eq!(still_null.total_value, None);

        let filled = store
            .merge_by_stage(deal("Qualified", 1, Some("20.00")))
            .await
            .unwrap();
        assert_eq!(filled.count, 4);
        assert_eq!(filled.total_value, Some("20.00".parse().unwrap()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_merges_do_not_lose_increments() {
        let store = Arc::new(MemoryDealInsightStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.merge_by_stage(deal("Race", 1, Some("1.00"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let row = store.find_by_stage("Race").await.unwrap().unwrap();
        assert_eq!(row.count, 50);
        assert_eq!(row.total_value, Some("50.00".parse().unwrap()));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
