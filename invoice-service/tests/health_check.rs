mod common;

use common::TestApp;
use invoice_service::services::metrics::init_metrics;
use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "invoice-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/ready"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn pdf_health_is_public() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/pdf/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "PDF Generator");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn metrics_are_exported() {
    init_metrics().expect("metrics recorder");
    let app = TestApp::spawn().await;
    let token = app.token().await;

    app.create_invoice(&token, &common::sample_invoice()).await;
    let pdf = app
        .generate_pdf(&token, &serde_json::json!({ "html": "<p>Invoice</p>" }))
        .await;
    assert_eq!(pdf.status(), 200);

    let response = app
        .client
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let text = response.text().await.expect("metrics body");
    assert!(text.contains("invoices_created_total"));
    assert!(text.contains("pdf_renders_total"));
    assert!(text.contains("pdf_render_duration_seconds"));
}
