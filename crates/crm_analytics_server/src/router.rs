//! Router construction for the CRM analytics server.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Extension, Router};
use crm_analytics_core::{AnalyticsServices, Record, ResourceService};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;

/// `/api/<kind>` and `/api/<kind>/paged` for one record kind.
fn resource_routes<R: Record>(service: Arc<dyn ResourceService<R>>) -> Router {
    let base = format!("/api/{}", R::KIND.path());
    Router::new()
        .route(
            &base,
            get(handlers::resources::list_all::<R>).post(handlers::resources::save::<R>),
        )
        .route(
            &format!("{base}/paged"),
            get(handlers::resources::list_paged::<R>),
        )
        .layer(Extension(service))
}

/// Build the full axum router with all routes and middleware.
pub fn build_router(services: AnalyticsServices, cors_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .merge(resource_routes(services.activity_stats))
        .merge(resource_routes(services.deal_insights))
        .merge(resource_routes(services.lead_analytics))
        .merge(resource_routes(services.overview_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
