use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

use crate::dtos::invoices::{CreateInvoiceRequest, InvoiceResponse, ListInvoicesQuery};
use crate::handlers::pdf::pdf_attachment;
use crate::middleware::AuthUser;
use crate::models::{CreateInvoice, Invoice};
use crate::services::metrics::record_invoice_created;
use crate::services::totals::compute_totals_from_inputs;
use crate::services::{render_invoice_html, InvoiceFilter, InvoiceRenderInput, PdfRenderRequest};
use crate::startup::AppState;
use crate::utils::ValidatedJson;

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let statuses = params
        .statuses()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let invoices = state.invoices.list(&InvoiceFilter { statuses }).await?;

    Ok(Json(
        invoices
            .into_iter()
            .map(InvoiceResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client_name = req.client_name.trim().to_string();
    if client_name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Client name is required")));
    }
    let invoice_id = req
        .invoice_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let (items, totals) = compute_totals_from_inputs(req.items)?;

    let invoice = Invoice::new(CreateInvoice {
        invoice_id,
        client_name,
        client_email: req.client_email,
        due_date: req.due_date,
        items,
        totals,
        status: req.status.unwrap_or_default(),
        created_by: claims.sub,
    });

    let invoice = state.invoices.create(invoice).await?;
    record_invoice_created(invoice.status.as_str());
    tracing::info!(
        invoice_id = %invoice.invoice_id,
        status = invoice.status.as_str(),
        grand_total = invoice.totals.grand_total,
        "Invoice created"
    );

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

async fn find_invoice(state: &AppState, invoice_id: &str) -> Result<Invoice, AppError> {
    state
        .invoices
        .get(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = find_invoice(&state, &invoice_id).await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

pub async fn get_invoice_pdf(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Response, AppError> {
    let invoice = find_invoice(&state, &invoice_id).await?;

    let input = InvoiceRenderInput::from_invoice(&invoice).with_branding(&state.branding);
    let html = render_invoice_html(&input)?;

    let pdf = state.pdf.render(PdfRenderRequest::new(html)).await?;
    Ok(pdf_attachment(pdf, &format!("{}.pdf", invoice.invoice_id)))
}
