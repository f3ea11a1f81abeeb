mod common;

use axum::http::StatusCode;
use common::{body_json, test_config, TestApp, FIXED_TS};
use docgen_service::config::{ConflictPolicy, StorageBackend};
use docgen_service::services::{init_metrics, Storage};
use docgen_service::startup::Application;
use reqwest::Client;
use uuid::Uuid;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::new(ConflictPolicy::Overwrite);

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "docgen-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::new(ConflictPolicy::Overwrite);

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    init_metrics();
    let app = TestApp::new(ConflictPolicy::Overwrite);

    // Record something first
    let response = app.post_form("title=Metrics&date=2024-07-23").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type")
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = String::from_utf8(common::body_bytes(response).await).unwrap();
    assert!(
        body.contains("documents_generated_total"),
        "Unexpected metrics format: {}",
        body
    );
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new(ConflictPolicy::Overwrite);

    let response = app.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn served_application_generates_documents() {
    let storage_path = format!("target/test-storage-{}", Uuid::new_v4());
    let config = test_config(StorageBackend::Local, &storage_path, ConflictPolicy::Overwrite);

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();
    let storage = app.storage().clone();

    tokio::spawn(app.run_until_stopped());

    let client = Client::new();
    let address = format!("http://127.0.0.1:{}", port);

    let response = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/generate", address))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("title=Served&date=2024-07-23")
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let disposition = response
        .headers()
        .get("content-disposition")
        .expect("Missing content-disposition header")
        .to_str()
        .unwrap()
        .to_string();
    let name = disposition
        .strip_prefix("attachment; filename=")
        .expect("Unexpected content-disposition")
        .to_string();
    assert!(name.starts_with("doc_") && name.ends_with(".docx"));
    // Served with the wall clock, not the fixed test instant
    assert_ne!(name, format!("doc_{}.docx", FIXED_TS));

    let body = response.bytes().await.unwrap();
    assert_eq!(storage.list().await.unwrap(), vec![name.clone()]);
    assert_eq!(storage.get(&name).await.unwrap(), body.to_vec());

    let _ = tokio::fs::remove_dir_all(&storage_path).await;
}
