//! Conversions from domain errors to HTTP-facing [`AppError`]s.

use service_core::error::AppError;

use crate::services::pdf::PdfError;
use crate::services::renderer::RenderError;
use crate::services::totals::CalculationError;

impl From<CalculationError> for AppError {
    fn from(err: CalculationError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidRenderInput(_) => AppError::BadRequest(anyhow::Error::new(err)),
            RenderError::Template(_) => AppError::RenderFailed(anyhow::Error::new(err)),
        }
    }
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidRequest(reason) => AppError::BadRequest(anyhow::anyhow!(reason)),
            other => AppError::RenderFailed(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    #[test]
    fn invalid_pdf_request_keeps_its_message() {
        let err = AppError::from(PdfError::InvalidRequest("HTML is required".to_string()));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Bad request: HTML is required");
    }

    #[test]
    fn pipeline_failures_become_render_failures() {
        let err = AppError::from(PdfError::ContentLoadTimeout(Duration::from_secs(30)));

        assert!(matches!(err, AppError::RenderFailed(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_line_item_is_bad_request() {
        let err = AppError::from(CalculationError::InvalidLineItem {
            index: 0,
            reason: "quantity must be positive".to_string(),
        });

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
