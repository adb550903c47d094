use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use health::HealthFlags;
use http_body_util::BodyExt; // for `collect`
use serde_json::{json, Value};
use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

use catalog::loader;
use catalog::router::router;
use catalog::seed::SeedData;
use catalog::store::MemoryStore;

fn app(store: MemoryStore, flags: HealthFlags) -> Router {
    router(store, flags, None)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reflects_healthy_flag() {
    let flags = HealthFlags::new();
    let app = app(MemoryStore::new(), flags.clone());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["service"], "product-service");
    assert!(body["version"].is_string());

    flags.set_healthy(false);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "DOWN");
    assert_eq!(body["service"], "product-service");
    assert!(body.get("version").is_none() || body["version"].is_null());
}

#[tokio::test]
async fn liveness_is_up_regardless_of_flags() {
    let flags = HealthFlags::new();
    flags.set_healthy(false);
    flags.set_ready(false);
    let app = app(MemoryStore::new(), flags);

    let (status, body) = get(&app, "/health/liveness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn readiness_gates_on_ready_flag() {
    let flags = HealthFlags::new();
    let app = app(MemoryStore::new(), flags.clone());

    // Unready until initialization completes.
    let (status, body) = get(&app, "/health/readiness").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "DOWN");
    assert!(body["timestamp"].is_string());

    flags.set_ready(true);
    let (status, body) = get(&app, "/health/readiness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");

    // A failed re-initialization takes readiness away again.
    flags.set_ready(false);
    let (status, _) = get(&app, "/health/readiness").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn api_serves_seeded_catalog() {
    let store = MemoryStore::new();
    let seed = SeedData::new(
        vec![json!({"id": "d1"}), json!({"id": "d2"})],
        vec![json!({"id": "p1"})],
    );
    loader::load_data(&store, &seed).await.unwrap();
    let app = app(store, HealthFlags::new());

    let (status, body) = get(&app, "/api/deals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": "p1"}]));
}

#[tokio::test]
async fn store_failure_answers_generic_500() {
    let store = MemoryStore::new();
    store.fail_reads_on("deals");
    let flags = HealthFlags::new();
    flags.set_ready(true);
    let app = app(store, flags.clone());

    let (status, body) = get(&app, "/api/deals").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // no internal detail in the body
    assert_eq!(body, json!({"error": "internal server error"}));

    // a single failed request does not change process-wide health
    assert!(flags.report_healthy());
    assert!(flags.report_ready());
    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = app(MemoryStore::new(), HealthFlags::new());
    let (status, _) = get(&app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
