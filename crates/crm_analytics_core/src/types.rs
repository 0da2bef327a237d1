//! Record types for the four analytics resources.
//!
//! Each resource has a stored shape (with its store-assigned `id`) and a
//! draft shape, which is what a client submits. Drafts carry an optional `id`:
//! for plain resources a known id means "replace that row", for deal insights
//! it is ignored in favour of the stage merge.

use std::fmt;

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Store-assigned identifier, shared by all record kinds.
pub type RecordId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    ActivityStat,
    DealInsight,
    LeadAnalytics,
    OverviewMetric,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::ActivityStat,
        RecordKind::DealInsight,
        RecordKind::LeadAnalytics,
        RecordKind::OverviewMetric,
    ];

    /// Path segment under `/api`.
    pub fn path(self) -> &'static str {
        match self {
            Self::ActivityStat => "activity-stats",
            Self::DealInsight => "deal-insights",
            Self::LeadAnalytics => "lead-analytics",
            Self::OverviewMetric => "overview-metrics",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::ActivityStat => "activity_stats",
            Self::DealInsight => "deal_insights",
            Self::LeadAnalytics => "lead_analytics",
            Self::OverviewMetric => "overview_metrics",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A field value extracted for in-memory ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Int(i64),
    Text(&'a str),
    Decimal(Option<Decimal>),
}

/// Common behaviour of the four stored record kinds.
pub trait Record: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    type Draft: Clone + fmt::Debug + DeserializeOwned + Send + Sync + 'static;

    const KIND: RecordKind;

    /// Wire property names accepted as `sort` keys.
    const SORTABLE: &'static [&'static str];

    fn id(&self) -> RecordId;

    fn draft_id(draft: &Self::Draft) -> Option<RecordId>;

    /// Build the stored record from a draft and the id the store chose.
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// The draft that would reproduce this record, id included.
    fn into_draft(self) -> Self::Draft;

    fn sort_value(&self, property: &str) -> Option<SortValue<'_>>;
}

// ── ActivityStat ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStat {
    pub id: RecordId,
    pub day: String,
    pub calls: i32,
    pub emails: i32,
    pub meetings: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityStatDraft {
    pub id: Option<RecordId>,
    pub day: String,
    pub calls: i32,
    pub emails: i32,
    pub meetings: i32,
}

impl Record for ActivityStat {
    type Draft = ActivityStatDraft;
    const KIND: RecordKind = RecordKind::ActivityStat;
    const SORTABLE: &'static [&'static str] = &["id", "day", "calls", "emails", "meetings"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn draft_id(draft: &ActivityStatDraft) -> Option<RecordId> {
        draft.id
    }

    fn from_draft(id: RecordId, draft: ActivityStatDraft) -> Self {
        Self {
            id,
            day: draft.day,
            calls: draft.calls,
            emails: draft.emails,
            meetings: draft.meetings,
        }
    }

    fn into_draft(self) -> ActivityStatDraft {
        ActivityStatDraft {
            id: Some(self.id),
            day: self.day,
            calls: self.calls,
            emails: self.emails,
            meetings: self.meetings,
        }
    }

    fn sort_value(&self, property: &str) -> Option<SortValue<'_>> {
        match property {
            "id" => Some(SortValue::Int(self.id)),
            "day" => Some(SortValue::Text(&self.day)),
            "calls" => Some(SortValue::Int(self.calls.into())),
            "emails" => Some(SortValue::Int(self.emails.into())),
            "meetings" => Some(SortValue::Int(self.meetings.into())),
            _ => None,
        }
    }
}

// ── DealInsight ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInsight {
    pub id: RecordId,
    pub stage: String,
    pub count: i64,
    #[serde(default, deserialize_with = "rust_decimal::serde::arbitrary_precision_option::deserialize")]
    pub total_value: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DealInsightDraft {
    pub id: Option<RecordId>,
    pub stage: String,
    pub count: i64,
    #[serde(default, deserialize_with = "rust_decimal::serde::arbitrary_precision_option::deserialize")]
    pub total_value: Option<Decimal>,
}

impl Record for DealInsight {
    type Draft = DealInsightDraft;
    const KIND: RecordKind = RecordKind::DealInsight;
    const SORTABLE: &'static [&'static str] = &["id", "stage", "count", "totalValue"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn draft_id(draft: &DealInsightDraft) -> Option<RecordId> {
        draft.id
    }

    fn from_draft(id: RecordId, draft: DealInsightDraft) -> Self {
        Self {
            id,
            stage: draft.stage,
            count: draft.count,
            total_value: draft.total_value,
        }
    }

    fn into_draft(self) -> DealInsightDraft {
        DealInsightDraft {
            id: Some(self.id),
            stage: self.stage,
            count: self.count,
            total_value: self.total_value,
        }
    }

    fn sort_value(&self, property: &str) -> Option<SortValue<'_>> {
        match property {
            "id" => Some(SortValue::Int(self.id)),
            "stage" => Some(SortValue::Text(&self.stage)),
            "count" => Some(SortValue::Int(self.count)),
            "totalValue" => Some(SortValue::Decimal(self.total_value)),
            _ => None,
        }
    }
}

// ── LeadAnalytics ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAnalytics {
    pub id: RecordId,
    pub source: String,
    pub count: i32,
    #[serde(default, deserialize_with = "rust_decimal::serde::arbitrary_precision_option::deserialize")]
    pub conversion_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadAnalyticsDraft {
    pub id: Option<RecordId>,
    pub source: String,
    pub count: i32,
    #[serde(default, deserialize_with = "rust_decimal::serde::arbitrary_precision_option::deserialize")]
    pub conversion_rate: Option<Decimal>,
}

impl Record for LeadAnalytics {
    type Draft = LeadAnalyticsDraft;
    const KIND: RecordKind = RecordKind::LeadAnalytics;
    const SORTABLE: &'static [&'static str] = &["id", "source", "count", "conversionRate"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn draft_id(draft: &LeadAnalyticsDraft) -> Option<RecordId> {
        draft.id
    }

    fn from_draft(id: RecordId, draft: LeadAnalyticsDraft) -> Self {
        Self {
            id,
            source: draft.source,
            count: draft.count,
            conversion_rate: draft.conversion_rate,
        }
    }

    fn into_draft(self) -> LeadAnalyticsDraft {
        LeadAnalyticsDraft {
            id: Some(self.id),
            source: self.source,
            count: self.count,
            conversion_rate: self.conversion_rate,
        }
    }

    fn sort_value(&self, property: &str) -> Option<SortValue<'_>> {
        match property {
            "id" => Some(SortValue::Int(self.id)),
            "source" => Some(SortValue::Text(&self.source)),
            "count" => Some(SortValue::Int(self.count.into())),
            "conversionRate" => Some(SortValue::Decimal(self.conversion_rate)),
            _ => None,
        }
    }
}

// ── OverviewMetric ────────────────────────────────────────────

/// `value` is opaque text; numeric-looking values are not parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetric {
    pub id: RecordId,
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverviewMetricDraft {
    pub id: Option<RecordId>,
    pub title: String,
    pub value: String,
}

impl Record for OverviewMetric {
    type Draft = OverviewMetricDraft;
    const KIND: RecordKind = RecordKind::OverviewMetric;
    const SORTABLE: &'static [&'static str] = &["id", "title", "value"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn draft_id(draft: &OverviewMetricDraft) -> Option<RecordId> {
        draft.id
    }

    fn from_draft(id: RecordId, draft: OverviewMetricDraft) -> Self {
        Self {
            id,
            title: draft.title,
            value: draft.value,
        }
    }

    fn into_draft(self) -> OverviewMetricDraft {
        OverviewMetricDraft {
            id: Some(self.id),
            title: self.title,
            value: self.value,
        }
    }

    fn sort_value(&self, property: &str) -> Option<SortValue<'_>> {
        match property {
            "id" => Some(SortValue::Int(self.id)),
            "title" => Some(SortValue::Text(&self.title)),
            "value" => Some(SortValue::Text(&self.value)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deal_insight_serializes_camel_case_with_string_decimal() {
        let deal = DealInsight {
            id: 7,
            stage: "Negotiation".into(),
            count: 8,
            total_value: Some("150.00".parse().unwrap()),
        };
        let json = serde_json::to_value(&deal).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "stage": "Negotiation",
                "count": 8,
                "totalValue": "150.00"
            })
        );
    }

    #[test]
    fn absent_total_serializes_as_null() {
        let deal = DealInsight {
            id: 1,
            stage: "Prospecting".into(),
            count: 2,
            total_value: None,
        };
        let json = serde_json::to_value(&deal).unwrap();
        assert!(json["totalValue"].is_null());
    }

    #[test]
    fn draft_accepts_numeric_and_string_decimals() {
        let from_number: DealInsightDraft =
            serde_json::from_str(r#"{"stage":"Closed","count":1,"totalValue":20.5}"#).unwrap();
        let from_string: DealInsightDraft =
            serde_json::from_str(r#"{"stage":"Closed","count":1,"totalValue":"20.50"}"#).unwrap();
        assert_eq!(from_number.total_value, from_string.total_value);
    }

    #[test]
    fn numeric_decimals_keep_every_digit() {
        let deal: DealInsightDraft = serde_json::from_str(
            r#"{"stage":"X","count":1,"totalValue":12345678901234567.89}"#,
        )
        .unwrap();
        assert_eq!(deal.total_value.unwrap().to_string(), "12345678901234567.89");

        let lead: LeadAnalyticsDraft =
            serde_json::from_str(r#"{"source":"Web","conversionRate":0.123456789012345678901}"#)
                .unwrap();
        assert_eq!(
            lead.conversion_rate.unwrap().to_string(),
            "0.123456789012345678901"
        );
    }

    #[test]
    fn draft_missing_fields_take_entity_defaults() {
        let draft: ActivityStatDraft = serde_json::from_str(r#"{"day":"Mon"}"#).unwrap();
        assert_eq!(draft.id, None);
        assert_eq!(draft.calls, 0);
        assert_eq!(draft.meetings, 0);

        let metric: OverviewMetricDraft = serde_json::from_str("{}").unwrap();
        assert_eq!(metric.title, "");
        assert_eq!(metric.value, "");
    }

    #[test]
    fn explicit_null_total_is_absent() {
        let draft: DealInsightDraft =
            serde_json::from_str(r#"{"stage":"Won","count":3,"totalValue":null}"#).unwrap();
        assert_eq!(draft.total_value, None);
    }

    #[test]
    fn sortable_properties_all_resolve() {
        let stat = ActivityStat::from_draft(1, ActivityStatDraft::default());
        for property in ActivityStat::SORTABLE {
            assert!(stat.sort_value(property).is_some(), "{property}");
        }
        let lead = LeadAnalytics::from_draft(1, LeadAnalyticsDraft::default());
        for property in LeadAnalytics::SORTABLE {
            assert!(lead.sort_value(property).is_some(), "{property}");
        }
        assert!(lead.sort_value("conversion_rate").is_none());
    }

    #[test]
    fn kind_paths_and_tables() {
        assert_eq!(RecordKind::DealInsight.path(), "deal-insights");
        assert_eq!(RecordKind::LeadAnalytics.table(), "lead_analytics");
        assert_eq!(RecordKind::OverviewMetric.to_string(), "overview_metrics");
    }
}
