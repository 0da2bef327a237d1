//! Row types and per-table column mappings.

use crm_analytics_core::types::*;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};

use crate::store::PgRecord;

type Q<'q, Row> = QueryAs<'q, Postgres, Row, PgArguments>;

#[derive(Debug, FromRow)]
pub struct PgActivityStatRow {
    pub id: i64,
    pub day: String,
    pub calls: i32,
    pub emails: i32,
    pub meetings: i32,
}

impl From<PgActivityStatRow> for ActivityStat {
    fn from(r: PgActivityStatRow) -> Self {
        Self {
            id: r.id,
            day: r.day,
            calls: r.calls,
            emails: r.emails,
            meetings: r.meetings,
        }
    }
}

impl PgRecord for ActivityStat {
    type Row = PgActivityStatRow;
    const COLUMNS: &'static [&'static str] = &["day", "calls", "emails", "meetings"];

    fn column(property: &str) -> Option<&'static str> {
        match property {
            "id" => Some("id"),
            "day" => Some("day"),
            "calls" => Some("calls"),
            "emails" => Some("emails"),
            "meetings" => Some("meetings"),
            _ => None,
        }
    }

    fn bind_draft<'q>(query: Q<'q, Self::Row>, draft: ActivityStatDraft) -> Q<'q, Self::Row> {
        query
            .bind(draft.day)
            .bind(draft.calls)
            .bind(draft.emails)
            .bind(draft.meetings)
    }
}

#[derive(Debug, FromRow)]
pub struct PgDealInsightRow {
    pub id: i64,
    pub stage: String,
    pub count: i64,
    pub total_value: Option<Decimal>,
}

impl From<PgDealInsightRow> for DealInsight {
    fn from(r: PgDealInsightRow) -> Self {
        Self {
            id: r.id,
            stage: r.stage,
            count: r.count,
            total_value: r.total_value,
        }
    }
}

impl PgRecord for DealInsight {
    type Row = PgDealInsightRow;
    const COLUMNS: &'static [&'static str] = &["stage", "count", "total_value"];

    fn column(property: &str) -> Option<&'static str> {
        match property {
            "id" => Some("id"),
            "stage" => Some("stage"),
            "count" => Some("count"),
            "totalValue" => Some("total_value"),
            _ => None,
        }
    }

    fn bind_draft<'q>(query: Q<'q, Self::Row>, draft: DealInsightDraft) -> Q<'q, Self::Row> {
        query
            .bind(draft.stage)
            .bind(draft.count)
            .bind(draft.total_value)
    }
}

#[derive(Debug, FromRow)]
pub struct PgLeadAnalyticsRow {
    pub id: i64,
    pub source: String,
    pub count: i32,
    pub conversion_rate: Option<Decimal>,
}

impl From<PgLeadAnalyticsRow> for LeadAnalytics {
    fn from(r: PgLeadAnalyticsRow) -> Self {
        Self {
            id: r.id,
            source: r.source,
            count: r.count,
            conversion_rate: r.conversion_rate,
        }
    }
}

impl PgRecord for LeadAnalytics {
    type Row = PgLeadAnalyticsRow;
    const COLUMNS: &'static [&'static str] = &["source", "count", "conversion_rate"];

    fn column(property: &str) -> Option<&'static str> {
        match property {
            "id" => Some("id"),
            "source" => Some("source"),
            "count" => Some("count"),
            "conversionRate" => Some("conversion_rate"),
            _ => None,
        }
    }

    fn bind_draft<'q>(query: Q<'q, Self::Row>, draft: LeadAnalyticsDraft) -> Q<'q, Self::Row> {
        query
            .bind(draft.source)
            .bind(draft.count)
            .bind(draft.conversion_rate)
    }
}

#[derive(Debug, FromRow)]
pub struct PgOverviewMetricRow {
    pub id: i64,
    pub title: String,
    pub value: String,
}

impl From<PgOverviewMetricRow> for OverviewMetric {
    fn from(r: PgOverviewMetricRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            value: r.value,
        }
    }
}

impl PgRecord for OverviewMetric {
    type Row = PgOverviewMetricRow;
    const COLUMNS: &'static [&'static str] = &["title", "value"];

    fn column(property: &str) -> Option<&'static str> {
        match property {
            "id" => Some("id"),
            "title" => Some("title"),
            "value" => Some("value"),
            _ => None,
        }
    }

    fn bind_draft<'q>(query: Q<'q, Self::Row>, draft: OverviewMetricDraft) -> Q<'q, Self::Row> {
        query.bind(draft.title).bind(draft.value)
    }
}
