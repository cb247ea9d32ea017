use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::{Invoice, InvoiceStatus, LineItem, LineItemInput};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 64, message = "Invoice id must be 1-64 characters"))]
    pub invoice_id: Option<String>,

    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,

    #[validate(email(message = "Invalid client email"))]
    pub client_email: Option<String>,

    #[serde(deserialize_with = "calendar_date")]
    pub due_date: NaiveDate,

    #[serde(default)]
    pub items: Vec<LineItemInput>,

    pub status: Option<InvoiceStatus>,
}

/// Accepts `2026-10-31` as well as a full RFC 3339 timestamp.
fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Comma-separated statuses, e.g. `paid,pending`.
    pub status: Option<String>,
}

impl ListInvoicesQuery {
    pub fn statuses(&self) -> Result<Vec<InvoiceStatus>, String> {
        let Some(raw) = &self.status else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub invoice_id: String,
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    pub due_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub grand_total: f64,
    pub status: InvoiceStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            client_name: invoice.client_name,
            client_email: invoice.client_email,
            due_date: invoice.due_date,
            items: invoice.items,
            subtotal: invoice.totals.subtotal,
            tax_rate: invoice.totals.tax_rate,
            tax: invoice.totals.tax,
            grand_total: invoice.totals.grand_total,
            status: invoice.status,
            created_by: invoice.created_by,
            created_at: invoice.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_accepts_timestamps() {
        let request: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
            "clientName": "Acme Corp",
            "dueDate": "2026-10-31T00:00:00.000Z",
            "items": [{ "name": "Design", "quantity": 2, "rate": 50, "total": 999 }],
            "status": "draft"
        }))
        .unwrap();

        assert_eq!(request.client_name, "Acme Corp");
        assert_eq!(request.due_date, NaiveDate::from_ymd_opt(2026, 10, 31).unwrap());
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.status, Some(InvoiceStatus::Draft));
        assert!(request.invoice_id.is_none());
    }

    #[test]
    fn bad_date_is_rejected() {
        let result = serde_json::from_value::<CreateInvoiceRequest>(serde_json::json!({
            "clientName": "Acme Corp",
            "dueDate": "next tuesday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn status_query_splits_on_commas() {
        let query = ListInvoicesQuery {
            status: Some("paid, Pending".to_string()),
        };
        assert_eq!(
            query.statuses(),
            Ok(vec![InvoiceStatus::Paid, InvoiceStatus::Pending])
        );

        assert_eq!(ListInvoicesQuery::default().statuses(), Ok(Vec::new()));
        assert_eq!(
            ListInvoicesQuery { status: Some(String::new()) }.statuses(),
            Ok(Vec::new())
        );
        assert!(ListInvoicesQuery { status: Some("paid,void".to_string()) }
            .statuses()
            .is_err());
    }
}
