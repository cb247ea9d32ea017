//! Invoice document renderer.
//!
//! Produces a single self-contained HTML document (inline styles, logo inlined
//! as a data URI) so the browser can render it without any network access.

use askama::Template;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::models::{Invoice, InvoiceStatus, LineItem};
use crate::services::totals::{round2, InvoiceTotals};

pub const DEFAULT_TITLE: &str = "INVOICE";
pub const DEFAULT_CURRENCY: &str = "INR";

const ALLOWED_LOGO_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid render input: {0}")]
    InvalidRenderInput(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Deployment-wide title and logo applied to stored invoices.
#[derive(Debug, Clone, Default)]
pub struct Branding {
    pub title: Option<String>,
    /// `data:image/<type>;base64,<payload>`
    pub logo_data_uri: Option<String>,
}

/// Everything the invoice document shows.
#[derive(Debug, Clone)]
pub struct InvoiceRenderInput {
    pub invoice_id: String,
    pub date: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
    pub status: Option<InvoiceStatus>,
    /// `data:image/<type>;base64,<payload>`
    pub logo_data_uri: Option<String>,
    pub title: Option<String>,
    pub currency: Option<String>,
}

impl InvoiceRenderInput {
    /// Render input for a stored invoice, dated by its due date.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id.clone(),
            date: invoice.due_date.format("%d %b %Y").to_string(),
            client_name: invoice.client_name.clone(),
            client_email: invoice.client_email.clone(),
            items: invoice.items.clone(),
            totals: invoice.totals,
            status: Some(invoice.status),
            logo_data_uri: None,
            title: None,
            currency: None,
        }
    }

    pub fn with_branding(mut self, branding: &Branding) -> Self {
        self.title = branding.title.clone();
        self.logo_data_uri = branding.logo_data_uri.clone();
        self
    }
}

struct RowView<'a> {
    name: &'a str,
    quantity: String,
    rate: String,
    total: String,
}

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceTemplate<'a> {
    title: &'a str,
    invoice_id: &'a str,
    date: &'a str,
    client_name: &'a str,
    client_email: Option<&'a str>,
    status: Option<&'static str>,
    logo: Option<&'a str>,
    currency: &'a str,
    rows: Vec<RowView<'a>>,
    subtotal: String,
    tax_percent: String,
    tax: String,
    grand_total: String,
}

fn amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}

fn require(field: &str, value: &str) -> Result<(), RenderError> {
    if value.trim().is_empty() {
        return Err(RenderError::InvalidRenderInput(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}

fn validate_logo(uri: &str) -> Result<(), RenderError> {
    let invalid = |reason: &str| RenderError::InvalidRenderInput(format!("logo {}", reason));

    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| invalid("must be a data URI"))?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid("must be base64 encoded"))?;

    if !ALLOWED_LOGO_TYPES.contains(&media_type) {
        return Err(invalid("must be an inline image"));
    }
    STANDARD
        .decode(payload)
        .map_err(|_| invalid("payload is not valid base64"))?;

    Ok(())
}

/// Render the invoice as a complete HTML document.
pub fn render_invoice_html(input: &InvoiceRenderInput) -> Result<String, RenderError> {
    require("invoice id", &input.invoice_id)?;
    require("date", &input.date)?;
    require("client name", &input.client_name)?;
    if let Some(logo) = &input.logo_data_uri {
        validate_logo(logo)?;
    }

    let rows = input
        .items
        .iter()
        .map(|item| RowView {
            name: item.name(),
            quantity: amount(item.quantity()),
            rate: amount(item.rate()),
            total: amount(item.total()),
        })
        .collect();

    let template = InvoiceTemplate {
        title: input.title.as_deref().unwrap_or(DEFAULT_TITLE),
        invoice_id: &input.invoice_id,
        date: &input.date,
        client_name: &input.client_name,
        client_email: input.client_email.as_deref().filter(|e| !e.trim().is_empty()),
        status: input.status.map(|s| s.as_str()),
        logo: input.logo_data_uri.as_deref(),
        currency: input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
        rows,
        subtotal: amount(input.totals.subtotal),
        tax_percent: format!("{}", (input.totals.tax_rate * 100.0).round()),
        tax: amount(input.totals.tax),
        grand_total: amount(input.totals.grand_total),
    };

    Ok(template.render()?)
}
