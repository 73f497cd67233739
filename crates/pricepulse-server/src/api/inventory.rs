use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricepulse_core::{
    analytics::{InventoryAlerts, InventoryMetrics},
    compute_price, filter_by_category, inventory_status, PricingFactors, PricingStrategy,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{soft_error, with_store, ApiError, AppState};

/// Stock swings larger than this trigger a reprice.
const REPRICE_THRESHOLD: i64 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct InventoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct InventoryStatusResponse {
    category: String,
    metrics: InventoryMetrics,
    alerts: InventoryAlerts,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct InventoryUpdateRequest {
    new_inventory: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct InventoryChange {
    old_inventory: i64,
    new_inventory: i64,
    difference: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceUpdate {
    new_price: f64,
    factors: PricingFactors,
}

#[derive(Debug, Serialize)]
pub(super) struct InventoryUpdateResponse {
    status: &'static str,
    message: &'static str,
    inventory_change: InventoryChange,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_update: Option<PriceUpdate>,
}

pub(super) async fn get_inventory_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<InventoryQuery>,
) -> Result<Response, ApiError> {
    let products = with_store(&state, &req_id.0, |store| store.list_products()).await?;
    if products.is_empty() {
        return Ok(soft_error("No inventory data available"));
    }

    let category = query.category.filter(|c| !c.trim().is_empty());
    let filtered = filter_by_category(&products, category.as_deref());
    if filtered.is_empty() {
        let category = category.unwrap_or_default();
        return Ok(soft_error(format!(
            "No inventory found for category: {category}"
        )));
    }

    let (metrics, alerts) = inventory_status(&filtered);

    Ok(Json(InventoryStatusResponse {
        category: category.unwrap_or_else(|| "all".to_owned()),
        metrics,
        alerts,
        timestamp: Utc::now(),
    })
    .into_response())
}

/// Set a product's stock level. A swing of more than
/// [`REPRICE_THRESHOLD`] units also reprices the product with the default
/// strategy, in the same write.
pub(super) async fn update_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
    Json(body): Json<InventoryUpdateRequest>,
) -> Result<Json<InventoryUpdateResponse>, ApiError> {
    let new_inventory = body.new_inventory;
    if new_inventory < 0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "new_inventory must not be negative",
        ));
    }

    let now = Utc::now();
    let id = product_id.clone();
    let (old_inventory, price_update) = with_store(&state, &req_id.0, move |store| {
        let config = store.config()?;
        store.update_product(&id, |product| {
            let old_inventory = std::mem::replace(&mut product.inventory, new_inventory);
            let price_update = ((new_inventory - old_inventory).abs() > REPRICE_THRESHOLD)
                .then(|| {
                    let quote = compute_price(product, PricingStrategy::Default, &config, now);
                    product.our_price = quote.price;
                    PriceUpdate {
                        new_price: quote.price,
                        factors: quote.factors,
                    }
                });
            (old_inventory, price_update)
        })
    })
    .await?;

    tracing::info!(
        product_id,
        old_inventory,
        new_inventory,
        repriced = price_update.is_some(),
        "inventory updated"
    );

    Ok(Json(InventoryUpdateResponse {
        status: "success",
        message: if price_update.is_some() {
            "Inventory and price updated"
        } else {
            "Inventory updated"
        },
        inventory_change: InventoryChange {
            old_inventory,
            new_inventory,
            difference: new_inventory - old_inventory,
        },
        price_update,
    }))
}
