//! Invoice record store.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

use crate::models::{Invoice, InvoiceStatus};

pub use memory::InMemoryInvoiceStore;
pub use mongo::MongoInvoiceStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invoice '{0}' already exists")]
    Duplicate(String),

    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            StoreError::Backend(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// Status filter for listing. Empty means every status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub statuses: Vec<InvoiceStatus>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&invoice.status)
    }
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a new invoice. Fails with [`StoreError::Duplicate`] when the id is taken.
    async fn create(&self, invoice: Invoice) -> Result<Invoice, StoreError>;

    async fn get(&self, invoice_id: &str) -> Result<Option<Invoice>, StoreError>;

    /// Invoices matching `filter`, most recently created first.
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
