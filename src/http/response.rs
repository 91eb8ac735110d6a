//! Response bodies and error mapping.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogSummary, IntegrityReport, Product};

/// Errors a route can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid parameters: {}", .0.join("; "))]
    InvalidParameters(Vec<String>),

    #[error("Service unavailable: upstream unreachable and no fallback data")]
    Unavailable,
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidParameters(vec![rejection.body_text()])
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Envelope shared by the data routes.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub integrity_report: IntegrityReport,
    /// Records came from the last-valid store, not a fresh fetch.
    pub fallback_used: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub page: usize,
    pub limit: usize,
    /// Valid products matching the filters, across all pages.
    pub total_items: usize,
    pub total_pages: usize,
    /// Records upstream returned before validation.
    pub total_records: usize,
}

pub type ProductsResponse = DataResponse<ProductsPage>;
pub type SummaryResponse = DataResponse<CatalogSummary>;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: f64,
}
