use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::Path;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "dev-only-jwt-secret";

#[derive(Debug)]
pub struct InvoiceConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub pdf: PdfConfig,
    pub branding: BrandingConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    MongoDb,
}

#[derive(Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub jwt_expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub engine: PdfEngine,
    pub webdriver_url: String,
    pub content_load_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEngine {
    WebDriver,
    Mock,
}

#[derive(Debug, Clone, Default)]
pub struct BrandingConfig {
    pub title: Option<String>,
    /// Image file inlined into every invoice PDF.
    pub logo_path: Option<String>,
}

impl InvoiceConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let mut common_config = core_config::Config::load()?;
        if common_config.otlp_endpoint.is_none() {
            common_config.otlp_endpoint = env::var("OTLP_ENDPOINT").ok();
        }

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("memory"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let mongodb_uri = match backend {
            StoreBackend::MongoDb => Some(get_env("MONGODB_URI", None, is_prod)?),
            StoreBackend::Memory => env::var("MONGODB_URI").ok(),
        };

        Ok(InvoiceConfig {
            common: common_config,
            store: StoreConfig {
                backend,
                mongodb_uri,
                mongodb_database: get_env("MONGODB_DATABASE", Some("invoice_db"), is_prod)?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?),
                jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", 24)?,
            },
            pdf: PdfConfig {
                engine: get_env("PDF_ENGINE", Some("webdriver"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                webdriver_url: get_env("WEBDRIVER_URL", Some("http://localhost:4444"), false)?,
                content_load_timeout: Duration::from_secs(parse_env(
                    "PDF_CONTENT_LOAD_TIMEOUT_SECS",
                    30,
                )?),
            },
            branding: BrandingConfig {
                title: env::var("INVOICE_BRAND_TITLE").ok(),
                logo_path: env::var("INVOICE_LOGO_PATH").ok(),
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl std::str::FromStr for PdfEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webdriver" => Ok(PdfEngine::WebDriver),
            "mock" => Ok(PdfEngine::Mock),
            _ => Err(format!("Invalid PDF engine: {}", s)),
        }
    }
}

impl BrandingConfig {
    /// Read the configured logo and encode it as a `data:` URI.
    pub fn logo_data_uri(&self) -> Result<Option<String>, AppError> {
        let Some(path) = &self.logo_path else {
            return Ok(None);
        };
        let path = Path::new(path);

        let media_type = logo_media_type(path).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "Unsupported logo format: {}",
                path.display()
            ))
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to read logo from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(format!(
            "data:{};base64,{}",
            media_type,
            STANDARD.encode(bytes)
        )))
    }
}

fn logo_media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
