use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

use crate::dtos::pdf::{GeneratePdfRequest, PdfHealthResponse};
use crate::middleware::AuthUser;
use crate::services::PdfDocument;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// Wrap a rendered PDF as a download named `filename`.
pub fn pdf_attachment(pdf: PdfDocument, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", sanitize_filename(filename));
    (
        [
            (header::CONTENT_TYPE, pdf.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.into_bytes(),
    )
        .into_response()
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<GeneratePdfRequest>,
) -> Result<Response, AppError> {
    tracing::info!(user = %claims.sub, "PDF generation requested");

    let pdf = state.pdf.render(req.into()).await?;
    Ok(pdf_attachment(pdf, "invoice.pdf"))
}

pub async fn pdf_health() -> Json<PdfHealthResponse> {
    Json(PdfHealthResponse {
        status: "OK",
        service: "PDF Generator",
        timestamp: Utc::now().to_rfc3339(),
    })
}
