//! HTTP layer tests through the router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use catalog_search::api::{build_router, AppState};
use catalog_search::catalog::CatalogService;
use catalog_search::config::{EngineBackend, EngineConfig};
use catalog_search::engine::{create_engine, InMemoryEngine};
use catalog_search::search::SearchConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let catalog = CatalogService::new(Arc::new(InMemoryEngine::new()), SearchConfig::default());
    build_router(AppState::new(Arc::new(catalog)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn laptop() -> Value {
    json!({
        "title": "Gaming Laptop",
        "description": "RGB keyboard",
        "category": "Electronics",
        "brand": "TechBrand",
        "price": 1299.99,
        "attributes": { "color": "black" }
    })
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["engine"], "in_memory");
}

#[tokio::test]
async fn test_health_reports_unreachable_engine() {
    let engine = create_engine(&EngineConfig {
        backend: EngineBackend::OpenSearch,
        url: "http://127.0.0.1:1".to_string(),
        ensure_index: false,
        ..EngineConfig::default()
    })
    .await
    .unwrap();
    let app = build_router(AppState::new(Arc::new(CatalogService::new(
        engine,
        SearchConfig::default(),
    ))));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    let (status, body) = send(&app, "GET", "/v1/search?q=laptop", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = app();

    let (status, created) = send(&app, "POST", "/v1/products", Some(laptop())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["isActive"], true);
    assert!(created["createdAt"].is_string());

    let (status, fetched) = send(&app, "GET", "/v1/products/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Gaming Laptop");

    let (status, updated) = send(&app, "PUT", "/v1/products/1", Some(json!({ "price": 999.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 999.0);
    assert_eq!(updated["brand"], "TechBrand");

    let (status, _) = send(&app, "DELETE", "/v1/products/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/v1/products/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_validation_error() {
    let mut invalid = laptop();
    invalid["price"] = json!(-5.0);

    let (status, body) = send(&app(), "POST", "/v1/products", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bulk_create_report() {
    let mut invalid = laptop();
    invalid["title"] = json!("");

    let (status, report) = send(
        &app(),
        "POST",
        "/v1/products/bulk",
        Some(json!({ "products": [laptop(), invalid] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["success"], false);
    assert_eq!(report["indexed"], 1);
    assert_eq!(report["errors"][0]["index"], 1);
}

#[tokio::test]
async fn test_search_and_facets_over_http() {
    let app = app();
    send(&app, "POST", "/v1/products", Some(laptop())).await;
    send(
        &app,
        "POST",
        "/v1/products",
        Some(json!({
            "title": "Wireless Mouse",
            "category": "Electronics",
            "brand": "TechBrand",
            "price": 79.99
        })),
    )
    .await;

    let (status, results) = send(&app, "GET", "/v1/search?q=gaming&category=Electronics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["total"], 1);
    assert_eq!(results["totalPages"], 1);
    assert_eq!(results["products"][0]["title"], "Gaming Laptop");
    assert!(results["products"][0]["score"].is_number());

    let (status, results) = send(&app, "GET", "/v1/search/facets?category=Electronics&facets=category,price_range", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["total"], 2);
    assert_eq!(results["facets"]["categories"][0]["count"], 2);
    assert_eq!(results["facets"]["brands"], json!([]));
    assert_eq!(results["facets"]["priceRanges"].as_array().unwrap().len(), 6);

    let (status, suggestions) = send(&app, "GET", "/v1/search/suggestions?q=wire&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(suggestions[0]["text"], "Wireless Mouse");
    assert_eq!(suggestions[0]["type"], "Product");
}

#[tokio::test]
async fn test_search_parameter_errors() {
    let app = app();

    let (status, _) = send(&app, "GET", "/v1/search?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/v1/search?page=18446744073709551615", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/v1/search?pageSize=1000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/v1/search?minPrice=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/v1/search/facets?facets=color", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_products_paginates() {
    let app = app();
    for _ in 0..3 {
        send(&app, "POST", "/v1/products", Some(laptop())).await;
    }

    let (status, page) = send(&app, "GET", "/v1/products?page=2&pageSize=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["products"].as_array().unwrap().len(), 1);
}
