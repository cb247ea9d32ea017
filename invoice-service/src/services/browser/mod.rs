//! Headless browser abstraction.
//!
//! A [`BrowserEngine`] launches isolated [`BrowserSession`]s. Each session is
//! owned by exactly one render and must be closed by it; sessions are never
//! pooled or reused.

pub mod mock;
pub mod webdriver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::{MockBrowserEngine, MockBrowserStats};
pub use webdriver::WebDriverEngine;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser unavailable: {0}")]
    Unavailable(String),

    #[error("Browser command failed: {0}")]
    Command(String),

    #[error("Invalid print settings: {0}")]
    InvalidPrintSettings(String),
}

/// Paper size for PDF export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    /// Width and height in centimetres.
    pub fn dimensions_cm(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (21.0, 29.7),
            PageFormat::Letter => (21.59, 27.94),
        }
    }
}

/// Page margins in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginsCm {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Resolved print settings handed to a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintSettings {
    pub format: PageFormat,
    pub margins: MarginsCm,
    pub print_background: bool,
}

#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Start a fresh, isolated browser session.
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One browser process/context. Stages are driven strictly in order by the
/// PDF renderer: `open_page`, `set_content`, `wait_for_network_idle`,
/// `print_to_pdf`, and always `close`.
#[async_trait]
pub trait BrowserSession: Send {
    async fn open_page(&mut self) -> Result<(), BrowserError>;

    async fn set_content(&mut self, html: &str) -> Result<(), BrowserError>;

    /// Resolves once the page has no in-flight resource loads. Never times
    /// out on its own; the caller bounds it.
    async fn wait_for_network_idle(&mut self) -> Result<(), BrowserError>;

    async fn print_to_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError>;

    /// Close the page and terminate the session. Safe to call after any
    /// earlier failure.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}
