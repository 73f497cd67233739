use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use pricepulse_core::{analytics::Summary, performance, summarize, ProductRecord};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{soft_error, with_store, ApiError, AppState};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum SummaryBody {
    Full(Summary),
    Empty {
        total_products: usize,
        message: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyticsResponse {
    analytics: Vec<ProductRecord>,
    summary: SummaryBody,
}

/// Every stored row plus aggregate statistics.
pub(super) async fn get_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let products = with_store(&state, &req_id.0, |store| store.list_products()).await?;

    let summary = summarize(&products).map_or(
        SummaryBody::Empty {
            total_products: 0,
            message: "No data available",
        },
        SummaryBody::Full,
    );

    Ok(Json(AnalyticsResponse {
        analytics: products,
        summary,
    }))
}

pub(super) async fn get_performance_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let products = with_store(&state, &req_id.0, |store| store.list_products()).await?;

    Ok(match performance(&products, Utc::now()) {
        Some(report) => Json(report).into_response(),
        None => soft_error("No data available for performance analytics"),
    })
}
