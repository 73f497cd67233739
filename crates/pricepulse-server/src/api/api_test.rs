use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use pricepulse_core::{ProductRecord, TestStatus};
use pricepulse_ingest::Ingestor;
use pricepulse_store::{MemoryBackend, Store, StoreBackend};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

fn product(id: &str, category: &str, inventory: i64) -> ProductRecord {
    ProductRecord {
        category: category.to_owned(),
        disc: 0,
        id: id.to_owned(),
        name: format!("Item {id}"),
        competitor_price: 1_000.0,
        our_price: 1_000.0,
        inventory,
        demand_score: 1.0,
        image_url: String::new(),
        timestamp: Utc::now(),
        url: String::new(),
    }
}

fn test_app(products: Vec<ProductRecord>) -> (Arc<MemoryBackend>, Router) {
    let backend = Arc::new(MemoryBackend::with_products(products));
    let store = Arc::new(Store::open(backend.clone()).expect("open store"));
    let ingestor = Arc::new(Ingestor::new(store, None));
    let app = build_app(AppState::new(ingestor), Path::new("static"));
    (backend, app)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn unknown_error_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn root_redirects_to_static_ui() {
    let (_backend, app) = test_app(vec![]);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"].to_str().expect("location"),
        "/static/index.html"
    );
}

#[tokio::test]
async fn request_id_is_echoed_back() {
    let (_backend, app) = test_app(vec![]);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn health_reports_product_count() {
    let (_backend, app) = test_app(vec![product("1", "phone", 50), product("2", "phone", 60)]);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "products": 2 }));
}

#[tokio::test]
async fn ingest_without_api_token_uses_fallback() {
    let (backend, app) = test_app(vec![]);
    let (status, body) = post(&app, "/ingest_product", json!({ "product_name": "laptop" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["products_added"], 3);
    assert_eq!(backend.load_products().expect("rows").len(), 3);
}

#[tokio::test]
async fn ingest_rejects_blank_name() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = post(&app, "/ingest_product", json!({ "product_name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn ingest_store_failure_is_a_server_error() {
    let (backend, app) = test_app(vec![]);
    backend.fail_writes(true);
    let (status, body) = post(&app, "/ingest_product", json!({ "product_name": "phone" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
}

#[tokio::test]
async fn product_by_id_without_api_reports_unavailable() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = post(&app, "/product_by_id", json!({ "id": "B0C1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Pricing API unavailable");
}

#[tokio::test]
async fn fallback_product_prices_at_or_below_competitor() {
    let (_backend, app) = test_app(vec![]);
    post(&app, "/ingest_product", json!({ "product_name": "phone" })).await;

    let (status, body) = get(&app, "/competitive_price/1").await;
    assert_eq!(status, StatusCode::OK);
    let our = body["our_price"].as_f64().expect("our_price");
    let competitor = body["competitor_price"].as_f64().expect("competitor_price");
    assert!(our <= competitor, "{our} > {competitor}");
    assert_eq!(body["strategy_used"], "default");
    assert!(body["pricing_factors"]["inventory_factor"].is_number());
}

#[tokio::test]
async fn analytics_on_empty_store() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = get(&app, "/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analytics"], json!([]));
    assert_eq!(
        body["summary"],
        json!({ "total_products": 0, "message": "No data available" })
    );
}

#[tokio::test]
async fn analytics_summarizes_rows() {
    let (_backend, app) = test_app(vec![
        product("1", "phone", 50),
        product("2", "laptop", 150),
    ]);
    let (_status, body) = get(&app, "/analytics").await;

    assert_eq!(body["analytics"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["analytics"][0]["type"], "phone");
    assert_eq!(body["summary"]["total_products"], 2);
    assert_eq!(body["summary"]["unique_categories"], 2);
    assert_eq!(body["summary"]["total_inventory"], 200);
    assert_eq!(body["summary"]["categories"]["laptop"], 1);
}

#[tokio::test]
async fn performance_analytics_soft_errors_without_data() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = get(&app, "/analytics/performance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No data available for performance analytics");
}

#[tokio::test]
async fn performance_analytics_groups_by_category() {
    let (_backend, app) = test_app(vec![product("1", "phone", 50), product("2", "phone", 10)]);
    let (_status, body) = get(&app, "/analytics/performance").await;
    assert_eq!(body["performance_by_category"]["phone"]["product_count"], 2);
    assert_eq!(body["trends"]["recent_products_added"], 2);
    assert_eq!(body["trends"]["price_change_trend"], "stable");
    assert_eq!(body["data_freshness"]["total_updates"], 2);
}

#[tokio::test]
async fn competitive_price_for_unknown_product_is_404() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = get(&app, "/competitive_price/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Product not found");
}

#[tokio::test]
async fn unknown_strategy_is_echoed_but_priced_as_default() {
    let (_backend, app) = test_app(vec![product("1", "phone", 50)]);
    let (_s, default) = get(&app, "/competitive_price/1").await;
    let (_s, unknown) = get(&app, "/competitive_price/1?strategy=mystery").await;
    assert_eq!(unknown["strategy_used"], "mystery");
    assert_eq!(unknown["our_price"], default["our_price"]);
}

#[tokio::test]
async fn bulk_update_reprices_category() {
    let (backend, app) = test_app(vec![
        product("1", "phone", 50),
        product("2", "laptop", 50),
    ]);
    let (status, body) = send(&app, Method::POST, "/update_prices?category=PHONE", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["products_updated"], 1);
    assert_eq!(body["category"], "PHONE");
    assert_eq!(body["updated_products"][0]["product_id"], "1");

    let rows = backend.load_products().expect("rows");
    assert!(rows[0].our_price < 1_000.0);
    assert!((rows[1].our_price - 1_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn bulk_update_soft_errors() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = send(&app, Method::POST, "/update_prices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No products available for pricing update");

    let (_backend, app) = test_app(vec![product("1", "phone", 50)]);
    let (_status, body) = send(&app, Method::POST, "/update_prices?category=drones", None).await;
    assert_eq!(body["error"], "No products found in category: drones");
}

#[tokio::test]
async fn manual_price_update_is_persisted() {
    let (backend, app) = test_app(vec![product("7", "phone", 50)]);
    let (status, body) = post(&app, "/product/7/update_price", json!({ "new_price": 899.0 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["change_log"]["old_price"], 1_000.0);
    assert_eq!(body["change_log"]["new_price"], 899.0);
    assert_eq!(body["change_log"]["reason"], "manual_update");
    assert!((backend.load_products().expect("rows")[0].our_price - 899.0).abs() < f64::EPSILON);

    let (status, _body) = post(&app, "/product/8/update_price", json!({ "new_price": 1.0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_status_reports_alerts() {
    let (_backend, app) = test_app(vec![
        product("1", "phone", 0),
        product("2", "phone", 300),
        product("3", "laptop", 50),
    ]);
    let (status, body) = get(&app, "/inventory/status?category=phone").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "phone");
    assert_eq!(body["metrics"]["total_products"], 2);
    assert_eq!(body["metrics"]["out_of_stock_products"], 1);
    assert_eq!(body["metrics"]["high_inventory_products"], 1);
    assert_eq!(body["alerts"]["low_stock_products"][0]["id"], "1");

    let (_status, body) = get(&app, "/inventory/status?category=drones").await;
    assert_eq!(body["error"], "No inventory found for category: drones");
}

#[tokio::test]
async fn large_inventory_change_reprices() {
    let (backend, app) = test_app(vec![product("1", "phone", 100)]);

    let (_status, body) = post(&app, "/inventory/1/update", json!({ "new_inventory": 90 })).await;
    assert_eq!(body["message"], "Inventory updated");
    assert!(body.get("price_update").is_none());
    assert_eq!(body["inventory_change"]["difference"], -10);

    let (_status, body) = post(&app, "/inventory/1/update", json!({ "new_inventory": 20 })).await;
    assert_eq!(body["message"], "Inventory and price updated");
    let new_price = body["price_update"]["new_price"].as_f64().expect("new_price");

    let row = &backend.load_products().expect("rows")[0];
    assert_eq!(row.inventory, 20);
    assert!((row.our_price - new_price).abs() < f64::EPSILON);
}

#[tokio::test]
async fn invalid_discount_bounds_leave_config_unchanged() {
    let (_backend, app) = test_app(vec![]);
    let (status, body) = post(
        &app,
        "/admin/discount_params",
        json!({ "max_discount": 0.2, "min_discount": 0.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (_status, config) = get(&app, "/admin/discount_params").await;
    assert_eq!(config["max_discount"], 0.3);
    assert_eq!(config["min_discount"], 0.05);
}

#[tokio::test]
async fn discount_bounds_update_is_persisted() {
    let (backend, app) = test_app(vec![]);
    let (status, body) = post(
        &app,
        "/admin/discount_params",
        json!({ "max_discount": 0.4, "min_discount": 0.1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["max_discount"], 0.4);

    let stored = backend.load_config().expect("load").expect("config");
    assert!((stored.min_discount - 0.1).abs() < f64::EPSILON);

    let (status, _body) = post(&app, "/admin/discount_params", json!({ "max_discount": 0.4 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ab_test_lifecycle() {
    let (_backend, app) = test_app(vec![]);
    let (status, created) = post(
        &app,
        "/ab_test/create",
        json!({
            "test_name": "holiday",
            "strategy_a": { "name": "default" },
            "strategy_b": { "name": "aggressive" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["message"], "A/B test \"holiday\" created successfully");
    let id = created["test_id"].as_str().expect("test_id").to_owned();

    let (_status, active) = get(&app, "/ab_test/active").await;
    assert_eq!(active["active_tests"][&id]["traffic_split"], 0.5);

    for event in [
        json!({ "strategy": "a", "event_type": "view" }),
        json!({ "strategy": "a", "event_type": "conversion", "value": 120.0 }),
        json!({ "strategy": "b", "event_type": "view" }),
    ] {
        let (status, body) = post(&app, &format!("/ab_test/{id}/record"), event).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Event recorded");
    }

    let (status, results) = get(&app, &format!("/ab_test/{id}/results")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["test_data"]["results"]["strategy_a"]["conversions"], 1);
    assert_eq!(results["analysis"]["conversion_rate_a"], 100.0);
    assert_eq!(results["analysis"]["winner"], "a");
    assert_eq!(results["analysis"]["statistical_significance"], "insufficient_data");
}

#[tokio::test]
async fn zero_duration_test_is_completed_on_next_read() {
    let (backend, app) = test_app(vec![]);
    let (_status, created) = post(
        &app,
        "/ab_test/create",
        json!({
            "test_name": "instant",
            "strategy_a": {},
            "strategy_b": {},
            "duration_hours": 0
        }),
    )
    .await;
    let id = created["test_id"].as_str().expect("test_id").to_owned();

    let (_status, active) = get(&app, "/ab_test/active").await;
    assert!(active["active_tests"].get(&id).is_none());

    let registry = backend.load_ab_tests().expect("registry");
    assert_eq!(registry.get(&id).expect("stored").status, TestStatus::Completed);
}

#[tokio::test]
async fn ab_test_errors() {
    let (_backend, app) = test_app(vec![]);
    let (status, _body) = post(&app, "/ab_test/missing/record", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/ab_test/missing/results").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Test not found");

    let (_status, created) = post(
        &app,
        "/ab_test/create",
        json!({ "test_name": "t", "strategy_a": {}, "strategy_b": {} }),
    )
    .await;
    let id = created["test_id"].as_str().expect("test_id").to_owned();
    let (status, _body) = post(
        &app,
        &format!("/ab_test/{id}/record"),
        json!({ "strategy": "c" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _body) = post(
        &app,
        "/ab_test/create",
        json!({ "test_name": "t", "strategy_a": {}, "strategy_b": {}, "traffic_split": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_inventory_updates_are_all_persisted() {
    let products = (1..=8).map(|i| product(&i.to_string(), "phone", 100)).collect();
    let (backend, app) = test_app(products);

    let mut requests = tokio::task::JoinSet::new();
    for i in 1..=8 {
        let app = app.clone();
        requests.spawn(async move {
            post(&app, &format!("/inventory/{i}/update"), json!({ "new_inventory": 95 })).await
        });
    }
    while let Some(result) = requests.join_next().await {
        let (status, _body) = result.expect("request task");
        assert_eq!(status, StatusCode::OK);
    }

    let rows = backend.load_products().expect("rows");
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| r.inventory == 95));
}

#[tokio::test]
async fn store_task_panic_is_an_internal_error() {
    let store = Arc::new(Store::open(Arc::new(MemoryBackend::new())).expect("open store"));
    let state = AppState::new(Arc::new(Ingestor::new(store, None)));

    let result: Result<(), ApiError> =
        with_store(&state, "req-1", |_store| panic!("store task aborted")).await;
    let err = result.expect_err("panicking task must fail");

    assert_eq!(err.error.code, "internal_error");
    assert_eq!(err.meta.request_id, "req-1");
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}
