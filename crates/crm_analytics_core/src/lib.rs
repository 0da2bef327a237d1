//! CRM analytics core: pure domain types, port traits and the deal insight
//! stage merge. No sqlx; storage adapters live in `crm_analytics_postgres`.

pub mod error;
pub mod memory;
pub mod merge;
pub mod paging;
pub mod ports;
pub mod service;
pub mod types;

pub use error::CrmError;
pub use paging::{Direction, Page, PageRequest, Sort};
pub use ports::{AnalyticsStores, DealInsightStore, RecordStore};
pub use service::{AnalyticsServices, ResourceService};
pub use types::*;
