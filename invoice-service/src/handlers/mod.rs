pub mod auth;
pub mod health;
pub mod invoices;
pub mod pdf;

pub use auth::{login, register};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use invoices::{create_invoice, get_invoice, get_invoice_pdf, list_invoices};
pub use pdf::{generate_pdf, pdf_health};
