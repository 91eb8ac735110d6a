//! Route handlers.
//!
//! The data routes are thin: one call into the fetch context, then
//! validation, filtering and shaping of the records it returns.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::catalog::{paginate, summarize, validate_batch, ListQuery};
use crate::health::HealthReport;
use crate::http::response::{
    ApiError, DataResponse, ProductsPage, ProductsResponse, ResponseMeta, StatusResponse,
    SummaryResponse,
};
use crate::http::server::AppState;

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs_f64(),
    })
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::collect(&state.fetcher))
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let Query(query) = query?;
    let params = query.parse().map_err(ApiError::InvalidParameters)?;

    let outcome = state
        .fetcher
        .fetch_detached(&state.cache_key, params.bypass_cache)
        .await;
    let records = outcome.records.as_deref().ok_or(ApiError::Unavailable)?;

    let batch = validate_batch(records, &state.fetcher.source());
    let matching: Vec<_> = batch
        .products
        .iter()
        .filter(|p| params.matches(p))
        .cloned()
        .collect();
    let page = paginate(&matching, params.page, params.limit);

    Ok(Json(DataResponse {
        data: ProductsPage {
            products: page.items,
            page: page.page,
            limit: page.limit,
            total_items: page.total_items,
            total_pages: page.total_pages,
            total_records: batch.total_records,
        },
        meta: ResponseMeta {
            integrity_report: batch.report,
            fallback_used: outcome.used_fallback,
        },
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub bypass_cache: Option<String>,
}

pub async fn get_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(query) = query?;
    // Reuse the listing parser so flag spelling is consistent across routes.
    let params = ListQuery {
        bypass_cache: query.bypass_cache,
        ..ListQuery::default()
    }
    .parse()
    .map_err(ApiError::InvalidParameters)?;

    let outcome = state
        .fetcher
        .fetch_detached(&state.cache_key, params.bypass_cache)
        .await;
    let records = outcome.records.as_deref().ok_or(ApiError::Unavailable)?;

    let batch = validate_batch(records, &state.fetcher.source());
    let summary = summarize(&batch);

    Ok(Json(DataResponse {
        data: summary,
        meta: ResponseMeta {
            integrity_report: batch.report,
            fallback_used: outcome.used_fallback,
        },
    }))
}
