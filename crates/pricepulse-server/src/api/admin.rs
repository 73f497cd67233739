use axum::{extract::State, Extension, Json};
use pricepulse_core::PricingConfig;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{with_store, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DiscountParams {
    max_discount: Option<f64>,
    min_discount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DiscountParamsResponse {
    status: &'static str,
    config: PricingConfig,
}

pub(super) async fn get_discount_params(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<PricingConfig>, ApiError> {
    with_store(&state, &req_id.0, |store| store.config())
        .await
        .map(Json)
}

/// Both bounds are required and must satisfy
/// `0 <= min_discount <= max_discount <= 1`. A rejected request leaves the
/// stored config untouched.
pub(super) async fn update_discount_params(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<DiscountParams>,
) -> Result<Json<DiscountParamsResponse>, ApiError> {
    let (Some(min), Some(max)) = (params.min_discount, params.max_discount) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "Missing parameters: min_discount and max_discount are both required",
        ));
    };

    let config =
        with_store(&state, &req_id.0, move |store| store.update_discount_bounds(min, max)).await?;
    tracing::info!(min_discount = min, max_discount = max, "discount bounds updated");

    Ok(Json(DiscountParamsResponse {
        status: "success",
        config,
    }))
}
