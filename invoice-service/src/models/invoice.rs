//! Invoice model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LineItem;
use crate::services::totals::InvoiceTotals;

/// Invoice status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    #[default]
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Stored invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    pub due_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
    pub created_by: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating an invoice; totals are already computed.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub invoice_id: Option<String>,
    pub client_name: String,
    pub client_email: Option<String>,
    pub due_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
    pub created_by: String,
}

impl Invoice {
    pub fn new(input: CreateInvoice) -> Self {
        Self {
            invoice_id: input.invoice_id.unwrap_or_else(generate_invoice_id),
            client_name: input.client_name,
            client_email: input.client_email,
            due_date: input.due_date,
            items: input.items,
            totals: input.totals,
            status: input.status,
            created_by: input.created_by,
            created_at: Utc::now(),
        }
    }
}

/// `INV-` followed by the first eight hex digits of a v4 UUID, upper-cased.
pub fn generate_invoice_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("INV-{}", id[..8].to_uppercase())
}
