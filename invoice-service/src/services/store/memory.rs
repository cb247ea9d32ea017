use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{InvoiceFilter, InvoiceStore, StoreError};
use crate::models::Invoice;

/// Process-local store, used in development and tests.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<Vec<Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.invoice_id))]
    async fn create(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        let mut invoices = self.invoices.write().await;

        if invoices.iter().any(|i| i.invoice_id == invoice.invoice_id) {
            return Err(StoreError::Duplicate(invoice.invoice_id));
        }

        invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn get(&self, invoice_id: &str) -> Result<Option<Invoice>, StoreError> {
        let invoices = self.invoices.read().await;
        Ok(invoices.iter().find(|i| i.invoice_id == invoice_id).cloned())
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self.invoices.read().await;

        // Newest insertion first so equal timestamps keep creation order reversed.
        let mut matching: Vec<Invoice> = invoices
            .iter()
            .rev()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateInvoice, InvoiceStatus, LineItem};
    use crate::services::totals::compute_totals;
    use chrono::NaiveDate;

    fn invoice(id: &str, status: InvoiceStatus) -> Invoice {
        let items = vec![LineItem::new("Design", 2.0, 50.0).unwrap()];
        let totals = compute_totals(&items);
        Invoice::new(CreateInvoice {
            invoice_id: Some(id.to_string()),
            client_name: "Acme Corp".to_string(),
            client_email: None,
            due_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            items,
            totals,
            status,
            created_by: "owner@example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemoryInvoiceStore::new();
        store.create(invoice("INV-1", InvoiceStatus::Paid)).await.unwrap();

        let found = store.get("INV-1").await.unwrap().unwrap();
        assert_eq!(found.invoice_id, "INV-1");
        assert_eq!(found.totals.grand_total, 118.0);
        assert!(store.get("INV-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryInvoiceStore::new();
        store.create(invoice("INV-1", InvoiceStatus::Paid)).await.unwrap();

        let err = store
            .create(invoice("INV-1", InvoiceStatus::Draft))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(id) if id == "INV-1"));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let store = InMemoryInvoiceStore::new();
        store.create(invoice("INV-1", InvoiceStatus::Paid)).await.unwrap();
        store.create(invoice("INV-2", InvoiceStatus::Draft)).await.unwrap();
        store.create(invoice("INV-3", InvoiceStatus::Pending)).await.unwrap();

        let all = store.list(&InvoiceFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|i| i.invoice_id.as_str()).collect();
        assert_eq!(ids, ["INV-3", "INV-2", "INV-1"]);

        let filter = InvoiceFilter {
            statuses: vec![InvoiceStatus::Paid, InvoiceStatus::Pending],
        };
        let some = store.list(&filter).await.unwrap();
        let ids: Vec<_> = some.iter().map(|i| i.invoice_id.as_str()).collect();
        assert_eq!(ids, ["INV-3", "INV-1"]);
    }
}
