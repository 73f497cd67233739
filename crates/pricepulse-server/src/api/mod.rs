mod admin;
mod analytics;
mod ingest;
mod inventory;
mod pricing;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricepulse_core::CoreError;
use pricepulse_ingest::{IngestError, Ingestor};
use pricepulse_store::{Store, StoreError};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self {
            store: Arc::clone(ingestor.store()),
            ingestor,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    products: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// `200` with a flat `{"error": ...}` body, for requests that found nothing
/// to work on.
pub(super) fn soft_error(message: impl Into<String>) -> Response {
    Json(json!({ "error": message.into() })).into_response()
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::ProductNotFound(_) => {
            ApiError::new(request_id, "not_found", "Product not found")
        }
        StoreError::Core(CoreError::TestNotFound(_)) => {
            ApiError::new(request_id, "not_found", "Test not found")
        }
        StoreError::Core(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        _ => {
            tracing::error!(error = %error, "store operation failed");
            ApiError::new(request_id, "internal_error", "store operation failed")
        }
    }
}

/// Run `f` against the store on the blocking thread pool. Store calls read
/// and rewrite whole files under a lock, so they stay off the async workers.
pub(super) async fn with_store<T, F>(
    state: &AppState,
    request_id: &str,
    f: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || f(&store)).await {
        Ok(result) => result.map_err(|e| map_store_error(request_id.to_owned(), &e)),
        Err(e) => {
            tracing::error!(error = %e, "store task did not complete");
            Err(ApiError::new(
                request_id,
                "internal_error",
                "store operation failed",
            ))
        }
    }
}

pub(super) fn map_ingest_error(request_id: String, error: &IngestError) -> ApiError {
    match error {
        IngestError::Store(e) => map_store_error(request_id, e),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ingest_product", post(ingest::ingest_product))
        .route("/product_by_id", post(ingest::product_by_id))
        .route("/analytics", get(analytics::get_analytics))
        .route(
            "/analytics/performance",
            get(analytics::get_performance_analytics),
        )
        .route("/ab_test/create", post(ab_test::create_test))
        .route("/ab_test/active", get(ab_test::list_active_tests))
        .route("/ab_test/{test_id}/record", post(ab_test::record_event))
        .route("/ab_test/{test_id}/results", get(ab_test::get_results))
        .route(
            "/competitive_price/{product_id}",
            get(pricing::get_competitive_price),
        )
        .route("/update_prices", post(pricing::update_bulk_prices))
        .route(
            "/product/{product_id}/update_price",
            post(pricing::update_product_price),
        )
        .route("/inventory/status", get(inventory::get_inventory_status))
        .route(
            "/inventory/{product_id}/update",
            post(inventory::update_inventory),
        )
        .route(
            "/admin/discount_params",
            get(admin::get_discount_params).post(admin::update_discount_params),
        )
}

/// The full HTTP surface: JSON API, static UI under `/static`, and a root
/// redirect to the UI entry page.
pub fn build_app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route(
            "/",
            get(|| async { Redirect::temporary("/static/index.html") }),
        )
        .nest_service("/static", ServeDir::new(static_dir))
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<HealthData>, ApiError> {
    let products = with_store(&state, &req_id.0, |store| store.list_products())
        .await?
        .len();

    Ok(Json(HealthData {
        status: "ok",
        products,
    }))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
