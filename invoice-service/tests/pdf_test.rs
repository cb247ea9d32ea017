mod common;

use common::TestApp;
use invoice_service::services::browser::MockBrowserEngine;
use serde_json::{json, Value};
use std::time::Duration;

const HTML: &str = "<!DOCTYPE html><html><body><h1>Invoice</h1></body></html>";
const REMOTE_HTML: &str =
    "<html><body><img src=\"https://cdn.example.com/logo.png\"></body></html>";

#[tokio::test]
async fn generate_returns_pdf_attachment() {
    let app = TestApp::spawn().await;
    let token = app.token().await;

    let response = app.generate_pdf(&token, &json!({ "html": HTML })).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"invoice.pdf\""
    );
    let bytes = response.bytes().await.expect("PDF body");
    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(app.browser.launched(), 1);
    assert_eq!(app.browser.closed(), 1);
}

#[tokio::test]
async fn generate_accepts_print_options() {
    let app = TestApp::spawn().await;
    let token = app.token().await;

    let response = app
        .generate_pdf(
            &token,
            &json!({
                "html": HTML,
                "options": {
                    "format": "Letter",
                    "margin": { "top": "1in", "right": "10mm", "bottom": "1in", "left": "10mm" },
                    "printBackground": false
                }
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn missing_html_is_bad_request_without_launch() {
    let app = TestApp::spawn().await;
    let token = app.token().await;

    for body in [json!({}), json!({ "html": "" }), json!({ "html": "   " })] {
        let response = app.generate_pdf(&token, &body).await;
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["error"], "HTML is required");
    }
    assert_eq!(app.browser.launched(), 0);
}

#[tokio::test]
async fn generate_requires_authentication() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/pdf/generate"))
        .json(&json!({ "html": HTML }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
    assert_eq!(app.browser.launched(), 0);
}

#[tokio::test]
async fn content_timeout_is_generic_failure_and_tears_down() {
    let app = TestApp::spawn_with(MockBrowserEngine::new(), Duration::from_millis(200)).await;
    let token = app.token().await;

    let response = app.generate_pdf(&token, &json!({ "html": REMOTE_HTML })).await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Failed to generate PDF");
    assert!(body.get("details").is_none());
    assert_eq!(app.browser.launched(), 1);
    assert_eq!(app.browser.live(), 0);
}

#[tokio::test]
async fn launch_failure_is_generic_failure() {
    let engine = MockBrowserEngine::new().with_failing_launch();
    let app = TestApp::spawn_with(engine, Duration::from_secs(5)).await;
    let token = app.token().await;

    let response = app.generate_pdf(&token, &json!({ "html": HTML })).await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Failed to generate PDF");
}

#[tokio::test]
async fn concurrent_requests_are_isolated_from_a_failing_peer() {
    let engine = MockBrowserEngine::new().with_latency(Duration::from_millis(20));
    let app = TestApp::spawn_with(engine, Duration::from_millis(300)).await;
    let token = app.token().await;

    let bodies: Vec<Value> = (0..5)
        .map(|i| json!({ "html": if i == 0 { REMOTE_HTML } else { HTML } }))
        .collect();
    let requests = bodies.iter().map(|body| app.generate_pdf(&token, body));
    let responses = futures::future::join_all(requests).await;

    let statuses: Vec<u16> = responses.iter().map(|r| r.status().as_u16()).collect();
    assert_eq!(statuses, [500, 200, 200, 200, 200]);
    assert_eq!(app.browser.launched(), 5);
    assert_eq!(app.browser.live(), 0);
}
