use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::browser::PageFormat;
use crate::services::pdf::{Margins, PdfRenderOptions, PdfRenderRequest};

/// Body of `POST /api/pdf/generate`. Missing fields fall back to print defaults.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GeneratePdfRequest {
    #[serde(default)]
    pub html: Option<String>,

    #[serde(default)]
    pub options: PdfOptionsDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptionsDto {
    pub format: Option<PageFormat>,
    pub margin: Option<MarginDto>,
    pub print_background: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarginDto {
    pub top: Option<String>,
    pub right: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
}

impl From<GeneratePdfRequest> for PdfRenderRequest {
    fn from(request: GeneratePdfRequest) -> Self {
        let defaults = PdfRenderOptions::default();
        let margin = request.options.margin.unwrap_or_default();

        PdfRenderRequest {
            html: request.html.unwrap_or_default(),
            options: PdfRenderOptions {
                format: request.options.format.unwrap_or(defaults.format),
                margins: Margins {
                    top: margin.top.unwrap_or(defaults.margins.top),
                    right: margin.right.unwrap_or(defaults.margins.right),
                    bottom: margin.bottom.unwrap_or(defaults.margins.bottom),
                    left: margin.left.unwrap_or(defaults.margins.left),
                },
                print_background: request
                    .options
                    .print_background
                    .unwrap_or(defaults.print_background),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PdfHealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_use_defaults() {
        let request: GeneratePdfRequest =
            serde_json::from_str(r#"{ "html": "<p>hi</p>" }"#).unwrap();
        let render = PdfRenderRequest::from(request);

        assert_eq!(render.html, "<p>hi</p>");
        assert_eq!(render.options, PdfRenderOptions::default());
    }

    #[test]
    fn partial_options_are_merged() {
        let request: GeneratePdfRequest = serde_json::from_str(
            r#"{
                "html": "<p>hi</p>",
                "options": { "format": "Letter", "margin": { "top": "1in" }, "printBackground": false }
            }"#,
        )
        .unwrap();
        let render = PdfRenderRequest::from(request);

        assert_eq!(render.options.format, PageFormat::Letter);
        assert_eq!(render.options.margins.top, "1in");
        assert_eq!(render.options.margins.left, "12mm");
        assert!(!render.options.print_background);
    }

    #[test]
    fn missing_html_becomes_empty() {
        let request: GeneratePdfRequest = serde_json::from_str("{}").unwrap();
        assert!(PdfRenderRequest::from(request).html.is_empty());
    }
}
