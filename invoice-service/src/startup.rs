use crate::config::{InvoiceConfig, PdfEngine, StoreBackend};
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::browser::{BrowserEngine, MockBrowserEngine, WebDriverEngine};
use crate::services::{
    Branding, InMemoryInvoiceStore, InvoiceStore, JwtService, MongoInvoiceStore, PdfRenderer,
    UserStore,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<dyn InvoiceStore>,
    pub users: Arc<UserStore>,
    pub jwt: JwtService,
    pub pdf: PdfRenderer,
    pub branding: Arc<Branding>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Build the application with the store and browser engine named in `config`.
    pub async fn build(config: InvoiceConfig) -> Result<Self, AppError> {
        let invoices: Arc<dyn InvoiceStore> = match config.store.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory invoice store; records are lost on restart");
                Arc::new(InMemoryInvoiceStore::new())
            }
            StoreBackend::MongoDb => {
                let uri = config.store.mongodb_uri.as_deref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("MONGODB_URI is required for mongodb"))
                })?;
                let store = MongoInvoiceStore::connect(uri, &config.store.mongodb_database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        AppError::from(e)
                    })?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    AppError::from(e)
                })?;
                Arc::new(store)
            }
        };

        let engine: Arc<dyn BrowserEngine> = match config.pdf.engine {
            PdfEngine::WebDriver => {
                tracing::info!(webdriver_url = %config.pdf.webdriver_url, "Using WebDriver PDF engine");
                Arc::new(WebDriverEngine::new(config.pdf.webdriver_url.clone()))
            }
            PdfEngine::Mock => {
                tracing::warn!("Using mock PDF engine; generated files are placeholders");
                Arc::new(MockBrowserEngine::new())
            }
        };

        Self::build_with(config, invoices, engine).await
    }

    /// Build the application around an explicit store and browser engine.
    pub async fn build_with(
        config: InvoiceConfig,
        invoices: Arc<dyn InvoiceStore>,
        engine: Arc<dyn BrowserEngine>,
    ) -> Result<Self, AppError> {
        let branding = Branding {
            title: config.branding.title.clone(),
            logo_data_uri: config.branding.logo_data_uri()?,
        };

        let state = AppState {
            invoices,
            users: Arc::new(UserStore::new()),
            jwt: JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiry_hours),
            pdf: PdfRenderer::new(engine, config.pdf.content_load_timeout),
            branding: Arc::new(branding),
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route("/api/invoices/:invoice_id", get(handlers::get_invoice))
        .route("/api/invoices/:invoice_id/pdf", get(handlers::get_invoice_pdf))
        .route("/api/pdf/generate", post(handlers::generate_pdf))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/pdf/health", get(handlers::pdf_health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::browser::MockBrowserEngine;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use secrecy::Secret;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            invoices: Arc::new(InMemoryInvoiceStore::new()),
            users: Arc::new(UserStore::new()),
            jwt: JwtService::new(&Secret::new("router-test-secret".to_string()), 1),
            pdf: PdfRenderer::new(Arc::new(MockBrowserEngine::new()), Duration::from_secs(5)),
            branding: Arc::new(Branding::default()),
        }
    }

    #[tokio::test]
    async fn pdf_health_needs_no_token() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/pdf/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "PDF Generator");
    }

    #[tokio::test]
    async fn invoices_need_a_token() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/invoices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generate_with_token_returns_pdf() {
        let state = test_state();
        let token = state.jwt.generate_token("ada@example.com", "Ada").unwrap();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/pdf/generate")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"html":"<p>Invoice</p>"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let state = test_state();
        let token = state.jwt.generate_token("ada@example.com", "Ada").unwrap();
        let html = "x".repeat(MAX_BODY_BYTES + 1);
        let body = serde_json::json!({ "html": html }).to_string();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/pdf/generate")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
