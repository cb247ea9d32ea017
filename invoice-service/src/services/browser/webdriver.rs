//! Chrome driven over the WebDriver protocol via `fantoccini`.
//!
//! Every launch opens a new WebDriver session, which makes chromedriver start
//! a dedicated headless Chrome process; closing the session terminates it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use fantoccini::{
    wd::{PrintConfiguration, PrintConfigurationBuilder, PrintMargins, PrintSize, WindowHandle},
    Client, ClientBuilder,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{BrowserEngine, BrowserError, BrowserSession, PageFormat, PrintSettings};

const CHROME_ARGS: &[&str] = &[
    "--headless=new",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

const VIEWPORT: (u32, u32) = (1200, 800);

/// Quiet period with no new resource activity before a page counts as idle.
const IDLE_WINDOW: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const WRITE_DOCUMENT_SCRIPT: &str =
    "document.open(); document.write(arguments[0]); document.close();";

const PAGE_ACTIVITY_SCRIPT: &str = r#"
return {
  ready: document.readyState === 'complete'
    && Array.from(document.images).every(function (img) { return img.complete; })
    && (!document.fonts || document.fonts.status === 'loaded'),
  resources: performance.getEntriesByType('resource').length
};
"#;

#[derive(Debug, Clone)]
pub struct WebDriverEngine {
    webdriver_url: String,
}

impl WebDriverEngine {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }

    fn capabilities() -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": CHROME_ARGS }),
        );
        caps
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        tracing::debug!(webdriver_url = %self.webdriver_url, "Starting WebDriver session");

        let client = ClientBuilder::native()
            .capabilities(Self::capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| BrowserError::Unavailable(e.to_string()))?;

        Ok(Box::new(WebDriverSession { client, page: None }))
    }
}

struct WebDriverSession {
    client: Client,
    page: Option<WindowHandle>,
}

#[derive(Debug, Deserialize)]
struct PageActivity {
    ready: bool,
    resources: u64,
}

fn command_error(context: &str, err: impl std::fmt::Display) -> BrowserError {
    BrowserError::Command(format!("{}: {}", context, err))
}

impl WebDriverSession {
    async fn page_activity(&self) -> Result<PageActivity, BrowserError> {
        let value = self
            .client
            .execute(PAGE_ACTIVITY_SCRIPT, Vec::new())
            .await
            .map_err(|e| command_error("probing page activity", e))?;

        serde_json::from_value(value).map_err(|e| command_error("reading page activity", e))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn open_page(&mut self) -> Result<(), BrowserError> {
        let window = self
            .client
            .new_window(true)
            .await
            .map_err(|e| command_error("opening tab", e))?;

        self.client
            .switch_to_window(window.handle.clone())
            .await
            .map_err(|e| command_error("switching to tab", e))?;
        self.page = Some(window.handle);

        self.client
            .set_window_size(VIEWPORT.0, VIEWPORT.1)
            .await
            .map_err(|e| command_error("sizing viewport", e))?;

        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<(), BrowserError> {
        self.client
            .goto("about:blank")
            .await
            .map_err(|e| command_error("navigating to blank page", e))?;

        self.client
            .execute(WRITE_DOCUMENT_SCRIPT, vec![json!(html)])
            .await
            .map_err(|e| command_error("writing document", e))?;

        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> Result<(), BrowserError> {
        let mut last_resources = None;
        let mut quiet_since = Instant::now();

        loop {
            let activity = self.page_activity().await?;

            if !activity.ready || last_resources != Some(activity.resources) {
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= IDLE_WINDOW {
                return Ok(());
            }
            last_resources = Some(activity.resources);

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn print_to_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError> {
        let config = print_configuration(settings)?;

        self.client
            .print(config)
            .await
            .map_err(|e| command_error("printing page", e))
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        let WebDriverSession { client, page } = *self;

        if page.is_some() {
            if let Err(e) = client.close_window().await {
                tracing::debug!(error = %e, "Closing tab failed, ending session anyway");
            }
        }

        client
            .close()
            .await
            .map_err(|e| command_error("ending session", e))
    }
}

fn print_configuration(settings: &PrintSettings) -> Result<PrintConfiguration, BrowserError> {
    let size = match settings.format {
        PageFormat::A4 => PrintSize::A4,
        PageFormat::Letter => PrintSize::US_LETTER,
    };

    PrintConfigurationBuilder::default()
        .size(size)
        .margins(PrintMargins {
            top: settings.margins.top,
            right: settings.margins.right,
            bottom: settings.margins.bottom,
            left: settings.margins.left,
        })
        .background(settings.print_background)
        .build()
        .map_err(|e| BrowserError::InvalidPrintSettings(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::browser::MarginsCm;

    fn settings(format: PageFormat, margin: f64) -> PrintSettings {
        PrintSettings {
            format,
            margins: MarginsCm {
                top: margin,
                right: margin,
                bottom: margin,
                left: margin,
            },
            print_background: true,
        }
    }

    #[test]
    fn default_margins_build_for_both_formats() {
        assert!(print_configuration(&settings(PageFormat::A4, 1.0)).is_ok());
        assert!(print_configuration(&settings(PageFormat::Letter, 1.0)).is_ok());
    }

    #[test]
    fn margins_wider_than_the_page_are_rejected() {
        assert!(matches!(
            print_configuration(&settings(PageFormat::A4, 20.0)),
            Err(BrowserError::InvalidPrintSettings(_))
        ));
    }
}
