#![allow(dead_code)]

use invoice_service::config::{
    AuthConfig, BrandingConfig, InvoiceConfig, PdfConfig, PdfEngine, StoreBackend, StoreConfig,
};
use invoice_service::services::browser::{MockBrowserEngine, MockBrowserStats};
use invoice_service::services::InMemoryInvoiceStore;
use invoice_service::startup::Application;
use reqwest::{Client, Response};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub browser: Arc<MockBrowserStats>,
}

fn test_config(content_load_timeout: Duration) -> InvoiceConfig {
    InvoiceConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb_uri: None,
            mongodb_database: "invoice_test".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: Secret::new("integration-test-secret".to_string()),
            jwt_expiry_hours: 1,
        },
        pdf: PdfConfig {
            engine: PdfEngine::Mock,
            webdriver_url: "http://localhost:4444".to_string(),
            content_load_timeout,
        },
        branding: BrandingConfig::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockBrowserEngine::new(), Duration::from_secs(5)).await
    }

    pub async fn spawn_with(engine: MockBrowserEngine, content_load_timeout: Duration) -> Self {
        let browser = engine.stats();

        let app = Application::build_with(
            test_config(content_load_timeout),
            Arc::new(InMemoryInvoiceStore::new()),
            Arc::new(engine),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
            browser,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a fresh user and return a bearer token for it.
    pub async fn token(&self) -> String {
        let email = format!("user-{}@example.com", Uuid::new_v4().simple());
        let response = self.register("Test User", &email, TEST_PASSWORD).await;
        assert_eq!(response.status(), 201);

        let body: Value = self
            .login(&email, TEST_PASSWORD)
            .await
            .json()
            .await
            .expect("Failed to parse JSON");
        body["token"]
            .as_str()
            .expect("login response has a token")
            .to_string()
    }

    pub async fn create_invoice(&self, token: &str, body: &Value) -> Response {
        self.client
            .post(self.url("/api/invoices"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn generate_pdf(&self, token: &str, body: &Value) -> Response {
        self.client
            .post(self.url("/api/pdf/generate"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn sample_invoice() -> Value {
    json!({
        "clientName": "Acme Corp",
        "clientEmail": "billing@acme.test",
        "dueDate": "2026-11-30",
        "items": [
            { "name": "Design", "quantity": 2, "rate": 50, "total": 1 },
            { "name": "Hosting", "quantity": 1, "rate": 25 }
        ]
    })
}
