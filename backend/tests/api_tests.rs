//! HTTP API tests
//!
//! Drives the router with an in-memory store: routing, status codes, JSON
//! bodies, the bilingual error envelope and CSV export.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::BRANCHES;
use roastery_inventory_backend::store::MemoryLedgerStore;
use roastery_inventory_backend::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let store = Arc::new(MemoryLedgerStore::with_branches(BRANCHES));
    create_app(AppState::new(store, Config::default()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_health_reports_store() {
    let app = app();
    let (status, body) = get_json(&app, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_catalog_and_warehouses() {
    let app = app();
    let (status, body) = get_json(&app, "/api/v1/catalog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["bean_types"]
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["name"] == "يمني"));

    let (status, body) = get_json(&app, "/api/v1/warehouses?kind=branch").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), BRANCHES.len());

    let (status, body) = get_json(&app, "/api/v1/warehouses?kind=depot").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Ledger flow
// ============================================================================

#[tokio::test]
async fn test_intake_then_roast_over_http() {
    let app = app();

    let (status, body) = post_json(
        &app,
        "/api/v1/intake",
        json!({ "bean_type": "يمني", "count": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["bag_codes"].as_array().unwrap().len(), 2);

    let (status, body) = get_json(&app, "/api/v1/stock/main").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_bags"], 2);

    let (status, _) = post_json(
        &app,
        "/api/v1/transfers/roastery",
        json!({ "bean_type": "يمني", "count": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let roast = json!({
        "inputs": [{ "bean_type": "يمني", "weight_kg": "50" }],
        "outputs": [{ "roast_type": "سلطان وسط", "weight_kg": "30" }],
        "reprocessed_weight_kg": null,
        "notes": null
    });
    let (status, preview) = post_json(&app, "/api/v1/roasting/preview", roast.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["waste_kg"], "20");

    let (status, receipt) = post_json(&app, "/api/v1/roasting", roast).await;
    assert_eq!(status, StatusCode::CREATED);
    let batch_id = receipt["batch_id"].as_str().unwrap().to_string();

    let (status, detail) = get_json(&app, &format!("/api/v1/roasting/{}", batch_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["outputs"][0]["label"], "سلطان وسط");

    let (status, history) = get_json(&app, "/api/v1/roasting").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, open) = get_json(&app, "/api/v1/dispatch/available").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open[0]["roast_type"], "سلطان وسط");
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_invalid_roast_returns_bilingual_error() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/roasting",
        json!({
            "inputs": [{ "bean_type": "يمني", "weight_kg": "10" }],
            "outputs": [{ "roast_type": "سلطان وسط", "weight_kg": "12" }],
            "reprocessed_weight_kg": null,
            "notes": null
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "outputs");
    assert!(!body["error"]["message_ar"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_shortfall_is_unprocessable() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/transfers/roastery",
        json!({ "bean_type": "يمني", "count": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INVENTORY");
}

#[tokio::test]
async fn test_unknown_batch_is_not_found() {
    let app = app();
    let (status, body) = get_json(
        &app,
        "/api/v1/roasting/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_branch_stock_csv_export() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/reports/branch-stock?format=csv")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "branch_name,roast_type,total_weight_kg");
    assert_eq!(lines.last().copied(), Some("الإجمالي,-,0"));

    let (status, body) = get_json(&app, "/api/v1/reports/branch-stock").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rows"].as_array().unwrap().is_empty());
}
