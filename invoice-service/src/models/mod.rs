//! Domain models for invoice-service.

mod invoice;
mod line_item;
mod user;

pub use invoice::{generate_invoice_id, CreateInvoice, Invoice, InvoiceStatus};
pub use line_item::{LineItem, LineItemInput};
pub use user::User;
