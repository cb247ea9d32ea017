pub mod browser;
pub mod jwt;
pub mod metrics;
pub mod pdf;
pub mod renderer;
pub mod store;
pub mod totals;
pub mod users;

pub use jwt::{Claims, JwtService};
pub use pdf::{PdfDocument, PdfError, PdfRenderRequest, PdfRenderer};
pub use renderer::{render_invoice_html, Branding, InvoiceRenderInput, RenderError};
pub use store::{InMemoryInvoiceStore, InvoiceFilter, InvoiceStore, MongoInvoiceStore, StoreError};
pub use users::UserStore;
