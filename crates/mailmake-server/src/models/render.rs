//! Rendered preview models

use mailmake::{DiagnosticInfo, RenderError, RenderResult};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/render`
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub content: String,
}

/// A render outcome as shown to clients
///
/// Exactly one of `html` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPreview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub warnings: Vec<DiagnosticInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RenderError>,
}

impl From<&RenderResult> for RenderPreview {
    fn from(result: &RenderResult) -> Self {
        match result {
            Ok(output) => Self {
                html: Some(output.html.clone()),
                title: output.document.title().map(str::to_string),
                warnings: output.document.warnings.clone(),
                error: None,
            },
            Err(error) => Self {
                html: None,
                title: None,
                warnings: Vec::new(),
                error: Some(error.clone()),
            },
        }
    }
}
