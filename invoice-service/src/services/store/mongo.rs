use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use tracing::instrument;

use super::{InvoiceFilter, InvoiceStore, StoreError};
use crate::models::Invoice;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoInvoiceStore {
    client: MongoClient,
    db: Database,
}

impl MongoInvoiceStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            StoreError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        let invoices = self.invoices();

        let id_index = IndexModel::builder()
            .keys(doc! { "invoice_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        invoices.create_index(id_index, None).await?;

        let listing_index = IndexModel::builder()
            .keys(doc! { "status": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("status_created_at".to_string())
                    .build(),
            )
            .build();
        invoices.create_index(listing_index, None).await?;

        tracing::info!("Created indexes on invoices.(invoice_id) and invoices.(status, created_at)");
        Ok(())
    }

    fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn status_query(filter: &InvoiceFilter) -> Document {
    if filter.statuses.is_empty() {
        return doc! {};
    }
    let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
    doc! { "status": { "$in": statuses } }
}

#[async_trait]
impl InvoiceStore for MongoInvoiceStore {
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.invoice_id))]
    async fn create(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        match self.invoices().insert_one(&invoice, None).await {
            Ok(_) => Ok(invoice),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(invoice.invoice_id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get(&self, invoice_id: &str) -> Result<Option<Invoice>, StoreError> {
        let invoice = self
            .invoices()
            .find_one(doc! { "invoice_id": invoice_id }, None)
            .await?;
        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let invoices = self
            .invoices()
            .find(status_query(filter), options)
            .await?
            .try_collect()
            .await?;
        Ok(invoices)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }
}
