//! Error-to-HTTP mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crm_analytics_core::CrmError;

#[derive(Debug)]
pub struct AppError(pub CrmError);

impl From<CrmError> for AppError {
    fn from(e: CrmError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CrmError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CrmError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_client_error() {
            tracing::debug!("rejected request: {}", self.0);
            self.0.to_string()
        } else {
            tracing::error!("request failed: {:#}", self.0);
            "internal server error".to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
