//! Template-related API models

use mailmake::{Template, TemplateIdentity};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Template summary for listing endpoints
#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: TemplateIdentity,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Template> for TemplateSummary {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            title: template.title,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

/// Body of `POST /api/templates`; a missing or null id inserts a new record
#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    #[serde(default)]
    pub id: TemplateIdentity,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Body of `PUT /api/templates/{id}`; a missing `content` keeps the stored markup
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub title: String,
    pub content: Option<String>,
}
