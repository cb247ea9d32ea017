//! HTML to PDF rendering through a headless browser.
//!
//! Each render is a strict sequence of stages on a session it owns alone:
//! launch → open page → load content (bounded wait for network-idle) →
//! export → teardown. Teardown runs on every exit path, and the pipeline runs
//! in its own task so it still completes if the caller goes away.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Instrument;

use crate::services::browser::{
    BrowserEngine, BrowserError, BrowserSession, MarginsCm, PageFormat, PrintSettings,
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub const DEFAULT_CONTENT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid PDF request: {0}")]
    InvalidRequest(String),

    #[error("Failed to launch browser: {0}")]
    EngineLaunchFailed(#[source] BrowserError),

    #[error("Failed to open page: {0}")]
    PageCreationFailed(#[source] BrowserError),

    #[error("Content did not reach network-idle within {0:?}")]
    ContentLoadTimeout(Duration),

    #[error("Failed to load content: {0}")]
    ContentLoadFailed(#[source] BrowserError),

    #[error("Failed to export PDF: {0}")]
    PdfExportFailed(String),

    #[error("Render task aborted: {0}")]
    TaskFailed(String),
}

impl PdfError {
    /// Metric label for the stage that failed.
    pub fn outcome(&self) -> &'static str {
        match self {
            PdfError::InvalidRequest(_) => "invalid_request",
            PdfError::EngineLaunchFailed(_) => "launch_failed",
            PdfError::PageCreationFailed(_) => "page_failed",
            PdfError::ContentLoadTimeout(_) => "content_timeout",
            PdfError::ContentLoadFailed(_) => "content_failed",
            PdfError::PdfExportFailed(_) => "export_failed",
            PdfError::TaskFailed(_) => "task_failed",
        }
    }
}

/// Page margins as CSS length strings (`16mm`, `1cm`, `0.5in`, `24px`, `12pt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: "16mm".to_string(),
            right: "12mm".to_string(),
            bottom: "16mm".to_string(),
            left: "12mm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfRenderOptions {
    pub format: PageFormat,
    pub margins: Margins,
    pub print_background: bool,
}

impl Default for PdfRenderOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            margins: Margins::default(),
            print_background: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfRenderRequest {
    pub html: String,
    pub options: PdfRenderOptions,
}

impl PdfRenderRequest {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            options: PdfRenderOptions::default(),
        }
    }

    /// Reject anything that cannot render before a browser is started.
    fn validate(&self) -> Result<PrintSettings, PdfError> {
        if self.html.trim().is_empty() {
            return Err(PdfError::InvalidRequest("HTML is required".to_string()));
        }

        let margins = MarginsCm {
            top: parse_length_cm(&self.options.margins.top)?,
            right: parse_length_cm(&self.options.margins.right)?,
            bottom: parse_length_cm(&self.options.margins.bottom)?,
            left: parse_length_cm(&self.options.margins.left)?,
        };

        let (width, height) = self.options.format.dimensions_cm();
        if margins.left + margins.right >= width || margins.top + margins.bottom >= height {
            return Err(PdfError::InvalidRequest(
                "margins leave no printable area".to_string(),
            ));
        }

        Ok(PrintSettings {
            format: self.options.format,
            margins,
            print_background: self.options.print_background,
        })
    }
}

/// Convert a CSS length to centimetres. Bare numbers are pixels.
pub fn parse_length_cm(value: &str) -> Result<f64, PdfError> {
    let value = value.trim();
    let invalid = || PdfError::InvalidRequest(format!("invalid margin length: {:?}", value));

    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !number.is_finite() || number < 0.0 {
        return Err(invalid());
    }

    let cm = match unit.to_ascii_lowercase().as_str() {
        "mm" => number / 10.0,
        "cm" => number,
        "in" => number * 2.54,
        "" | "px" => number * 2.54 / 96.0,
        "pt" => number * 2.54 / 72.0,
        _ => return Err(invalid()),
    };

    Ok(cm)
}

/// A finished PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfDocument {
    bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Clone)]
pub struct PdfRenderer {
    engine: Arc<dyn BrowserEngine>,
    content_load_timeout: Duration,
}

impl PdfRenderer {
    pub fn new(engine: Arc<dyn BrowserEngine>, content_load_timeout: Duration) -> Self {
        Self {
            engine,
            content_load_timeout,
        }
    }

    pub fn content_load_timeout(&self) -> Duration {
        self.content_load_timeout
    }

    /// Render `request.html` to PDF on a freshly launched browser session.
    pub async fn render(&self, request: PdfRenderRequest) -> Result<PdfDocument, PdfError> {
        let started = Instant::now();

        let result = match request.validate() {
            Ok(settings) => {
                let span = tracing::info_span!(
                    "pdf_render",
                    html_bytes = request.html.len(),
                    format = ?settings.format,
                );
                let pipeline = run_pipeline(
                    self.engine.clone(),
                    request.html,
                    settings,
                    self.content_load_timeout,
                )
                .instrument(span);

                match tokio::spawn(pipeline).await {
                    Ok(result) => result,
                    Err(e) => Err(PdfError::TaskFailed(e.to_string())),
                }
            }
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::counter!("pdf_renders_total", "outcome" => outcome).increment(1);
        metrics::histogram!("pdf_render_duration_seconds").record(elapsed.as_secs_f64());

        match &result {
            Ok(pdf) => tracing::info!(
                size = pdf.len(),
                duration_ms = elapsed.as_millis() as u64,
                "PDF generated"
            ),
            Err(PdfError::InvalidRequest(reason)) => {
                tracing::debug!(reason = %reason, "PDF request rejected")
            }
            Err(e) => tracing::error!(
                error = %e,
                outcome = outcome,
                duration_ms = elapsed.as_millis() as u64,
                "PDF generation failed"
            ),
        }

        result
    }
}

async fn run_pipeline(
    engine: Arc<dyn BrowserEngine>,
    html: String,
    settings: PrintSettings,
    content_load_timeout: Duration,
) -> Result<PdfDocument, PdfError> {
    let mut session = engine
        .launch()
        .await
        .map_err(PdfError::EngineLaunchFailed)?;

    let outcome = AssertUnwindSafe(drive_session(
        session.as_mut(),
        &html,
        &settings,
        content_load_timeout,
    ))
    .catch_unwind()
    .await
    .unwrap_or_else(|_| Err(PdfError::TaskFailed("render panicked".to_string())));

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Browser session did not close cleanly");
    }

    outcome
}

async fn drive_session(
    session: &mut dyn BrowserSession,
    html: &str,
    settings: &PrintSettings,
    content_load_timeout: Duration,
) -> Result<PdfDocument, PdfError> {
    session
        .open_page()
        .await
        .map_err(PdfError::PageCreationFailed)?;

    let load = async {
        session.set_content(html).await?;
        session.wait_for_network_idle().await
    };
    match tokio::time::timeout(content_load_timeout, load).await {
        Err(_) => return Err(PdfError::ContentLoadTimeout(content_load_timeout)),
        Ok(Err(e)) => return Err(PdfError::ContentLoadFailed(e)),
        Ok(Ok(())) => {}
    }

    let bytes = session
        .print_to_pdf(settings)
        .await
        .map_err(|e| PdfError::PdfExportFailed(e.to_string()))?;

    if bytes.is_empty() {
        return Err(PdfError::PdfExportFailed(
            "browser returned an empty document".to_string(),
        ));
    }

    Ok(PdfDocument { bytes })
}
