use axum::{extract::State, Extension, Json};
use pricepulse_ingest::IngestReport;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_ingest_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct IngestRequest {
    product_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductByIdRequest {
    id: String,
}

/// Runs to completion even when the pricing API is down: the report then
/// carries `source: "fallback"`.
pub(super) async fn ingest_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let term = body.product_name.trim();
    if term.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "product_name must not be empty",
        ));
    }

    state
        .ingestor
        .ingest(term)
        .await
        .map(Json)
        .map_err(|e| map_ingest_error(req_id.0, &e))
}

pub(super) async fn product_by_id(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ProductByIdRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = body.id.trim();
    if id.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "id must not be empty"));
    }

    Ok(Json(state.ingestor.product_specs(id).await.to_body()))
}
