//! Generic handlers shared by every record kind.
//!
//!   GET  /api/<kind>        every row
//!   GET  /api/<kind>/paged  one page (`page`, `size`, `sort`)
//!   POST /api/<kind>        save a draft

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::{Extension, Json};
use crm_analytics_core::{Page, PageRequest, Record, ResourceService, Sort};
use serde::Deserialize;

use crate::error::AppError;

/// Raw paging query. Values are normalized by `PageRequest::from_params`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl PageParams {
    pub fn into_request(self) -> Result<PageRequest, AppError> {
        let request = PageRequest::from_params(self.page, self.size);
        match self.sort.as_deref().map(str::trim) {
            None | Some("") => Ok(request),
            Some(raw) => Ok(request.with_sort(Sort::parse(raw)?)),
        }
    }
}

pub async fn list_all<R: Record>(
    Extension(service): Extension<Arc<dyn ResourceService<R>>>,
) -> Result<Json<Vec<R>>, AppError> {
    let rows = service.find_all().await?;
    tracing::debug!(kind = %R::KIND, rows = rows.len(), "listed all");
    Ok(Json(rows))
}

pub async fn list_paged<R: Record>(
    Extension(service): Extension<Arc<dyn ResourceService<R>>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<R>>, AppError> {
    let Query(params) = params?;
    let request = params.into_request()?;
    let page = service.find_page(request).await?;
    Ok(Json(page))
}

pub async fn save<R: Record>(
    Extension(service): Extension<Arc<dyn ResourceService<R>>>,
    body: Result<Json<R::Draft>, JsonRejection>,
) -> Result<Json<R>, AppError> {
    let Json(draft) = body?;
    let saved = service.save(draft).await?;
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_analytics_core::Direction;

    #[test]
    fn params_default_to_first_page_of_ten() {
        let request = PageParams::default().into_request().unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn sort_param_is_parsed() {
        let request = PageParams {
            page: Some(2),
            size: Some(5),
            sort: Some("calls,desc".into()),
        }
        .into_request()
        .unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.size, 5);
        let sort = request.sort.unwrap();
        assert_eq!(sort.property, "calls");
        assert_eq!(sort.direction, Direction::Desc);
    }

    #[test]
    fn blank_sort_means_unsorted() {
        let request = PageParams {
            sort: Some("  ".into()),
            ..Default::default()
        }
        .into_request()
        .unwrap();
        assert!(request.sort.is_none());
    }
}
