use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricepulse_core::{compute_price, PricingFactors, PricingStrategy};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{soft_error, with_store, ApiError, AppState};

/// Updated rows echoed back by a bulk update.
const UPDATED_PRODUCTS_SHOWN: usize = 10;

fn default_reason() -> String {
    "manual_update".to_owned()
}

#[derive(Debug, Deserialize)]
pub(super) struct StrategyQuery {
    pub strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkUpdateQuery {
    pub strategy: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CompetitivePrice {
    product_id: String,
    competitor_price: f64,
    our_price: f64,
    discount_percentage: f64,
    pricing_factors: PricingFactors,
    /// Echoes the requested name, even when it fell back to `default`.
    strategy_used: String,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceChange {
    product_id: String,
    product_name: String,
    old_price: f64,
    new_price: f64,
    discount_applied: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkUpdateResponse {
    status: &'static str,
    strategy_used: String,
    products_updated: usize,
    category: String,
    updated_products: Vec<PriceChange>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceUpdateRequest {
    new_price: f64,
    #[serde(default = "default_reason")]
    reason: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ChangeLog {
    product_id: String,
    old_price: f64,
    new_price: f64,
    reason: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceUpdateResponse {
    status: &'static str,
    message: &'static str,
    change_log: ChangeLog,
}

pub(super) async fn get_competitive_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
    Query(query): Query<StrategyQuery>,
) -> Result<Json<CompetitivePrice>, ApiError> {
    let id = product_id.clone();
    let (product, config) = with_store(&state, &req_id.0, move |store| {
        Ok((store.get_product(&id)?, store.config()?))
    })
    .await?;

    let strategy_used = query.strategy.unwrap_or_else(|| "default".to_owned());
    let now = Utc::now();
    let quote = compute_price(&product, PricingStrategy::parse(&strategy_used), &config, now);

    Ok(Json(CompetitivePrice {
        product_id,
        competitor_price: product.competitor_price,
        our_price: quote.price,
        discount_percentage: quote.discount_applied,
        pricing_factors: quote.factors,
        strategy_used,
        last_updated: now,
    }))
}

/// Reprice every row, or only rows in `category`, and persist the new
/// `our_price` values.
pub(super) async fn update_bulk_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BulkUpdateQuery>,
) -> Result<Response, ApiError> {
    let strategy_used = query.strategy.unwrap_or_else(|| "default".to_owned());
    let strategy = PricingStrategy::parse(&strategy_used);
    let category = query.category.filter(|c| !c.trim().is_empty());
    let now = Utc::now();

    let filter = category.clone();
    let (total_rows, changes) = with_store(&state, &req_id.0, move |store| {
        let config = store.config()?;
        store.update_products(|products| {
            let changes: Vec<PriceChange> = products
                .iter_mut()
                .filter(|p| filter.as_deref().is_none_or(|c| p.in_category(c)))
                .map(|product| {
                    let quote = compute_price(product, strategy, &config, now);
                    let old_price = product.our_price;
                    product.our_price = quote.price;
                    PriceChange {
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        old_price,
                        new_price: quote.price,
                        discount_applied: quote.discount_applied,
                    }
                })
                .collect();
            (products.len(), changes)
        })
    })
    .await?;

    if total_rows == 0 {
        return Ok(soft_error("No products available for pricing update"));
    }
    if changes.is_empty() {
        let category = category.unwrap_or_default();
        return Ok(soft_error(format!(
            "No products found in category: {category}"
        )));
    }

    let products_updated = changes.len();
    tracing::info!(
        strategy = strategy.as_str(),
        category = category.as_deref().unwrap_or("all"),
        products_updated,
        "bulk price update complete"
    );

    Ok(Json(BulkUpdateResponse {
        status: "success",
        strategy_used,
        products_updated,
        category: category.unwrap_or_else(|| "all".to_owned()),
        updated_products: changes.into_iter().take(UPDATED_PRODUCTS_SHOWN).collect(),
        timestamp: now,
    })
    .into_response())
}

pub(super) async fn update_product_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
    Json(body): Json<PriceUpdateRequest>,
) -> Result<Json<PriceUpdateResponse>, ApiError> {
    if !body.new_price.is_finite() || body.new_price < 0.0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "new_price must be a non-negative number",
        ));
    }

    let new_price = body.new_price;
    let id = product_id.clone();
    let old_price = with_store(&state, &req_id.0, move |store| {
        store.update_product(&id, |product| {
            std::mem::replace(&mut product.our_price, new_price)
        })
    })
    .await?;

    tracing::info!(
        product_id,
        old_price,
        new_price,
        reason = body.reason,
        "price updated manually"
    );

    Ok(Json(PriceUpdateResponse {
        status: "success",
        message: "Price updated successfully",
        change_log: ChangeLog {
            product_id,
            old_price,
            new_price,
            reason: body.reason,
            timestamp: Utc::now(),
        },
    }))
}
