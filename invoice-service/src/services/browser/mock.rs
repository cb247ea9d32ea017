//! In-process browser stand-in for tests and local development.
//!
//! Behaves like an offline browser: documents that reference remote
//! resources never reach network-idle. Sessions are counted so tests can
//! assert that every launched session was closed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserEngine, BrowserError, BrowserSession, PrintSettings};

/// Session counters shared between an engine and its sessions.
#[derive(Debug, Default)]
pub struct MockBrowserStats {
    launched: AtomicUsize,
    closed: AtomicUsize,
    exported: AtomicUsize,
}

impl MockBrowserStats {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn exported(&self) -> usize {
        self.exported.load(Ordering::SeqCst)
    }

    /// Sessions launched but not yet closed.
    pub fn live(&self) -> usize {
        self.launched() - self.closed()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBrowserEngine {
    stats: Arc<MockBrowserStats>,
    fail_launch: bool,
    fail_page: bool,
    fail_export: bool,
    panic_on_export: bool,
    latency: Duration,
}

impl MockBrowserEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn with_failing_page(mut self) -> Self {
        self.fail_page = true;
        self
    }

    pub fn with_failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    /// Make `print_to_pdf` panic instead of returning.
    pub fn with_panicking_export(mut self) -> Self {
        self.panic_on_export = true;
        self
    }

    /// Delay applied to each stage, to keep concurrent renders overlapping.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn stats(&self) -> Arc<MockBrowserStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl BrowserEngine for MockBrowserEngine {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        tokio::time::sleep(self.latency).await;

        if self.fail_launch {
            return Err(BrowserError::Unavailable(
                "mock browser refused to start".to_string(),
            ));
        }

        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            engine: self.clone(),
            html: None,
        }))
    }
}

struct MockSession {
    engine: MockBrowserEngine,
    html: Option<String>,
}

fn references_remote_resources(html: &str) -> bool {
    ["src=\"http", "src='http", "href=\"http", "href='http", "url(http"]
        .iter()
        .any(|pattern| html.contains(pattern))
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn open_page(&mut self) -> Result<(), BrowserError> {
        tokio::time::sleep(self.engine.latency).await;

        if self.engine.fail_page {
            return Err(BrowserError::Command("mock tab crashed".to_string()));
        }
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<(), BrowserError> {
        self.html = Some(html.to_string());
        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> Result<(), BrowserError> {
        let html = self
            .html
            .as_deref()
            .ok_or_else(|| BrowserError::Command("no content loaded".to_string()))?;

        if references_remote_resources(html) {
            std::future::pending::<()>().await;
        }

        tokio::time::sleep(self.engine.latency).await;
        Ok(())
    }

    async fn print_to_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError> {
        tokio::time::sleep(self.engine.latency).await;

        if self.engine.fail_export {
            return Err(BrowserError::Command("mock print failed".to_string()));
        }
        if self.engine.panic_on_export {
            panic!("mock print panicked");
        }

        let html = self.html.as_deref().unwrap_or_default();
        let (width, height) = settings.format.dimensions_cm();
        let pdf = format!(
            "%PDF-1.7\n% mock render {:?} {}x{}cm background={}\n% source {} bytes\n%%EOF\n",
            settings.format,
            width,
            height,
            settings.print_background,
            html.len()
        );

        self.engine.stats.exported.fetch_add(1, Ordering::SeqCst);
        Ok(pdf.into_bytes())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.engine.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
