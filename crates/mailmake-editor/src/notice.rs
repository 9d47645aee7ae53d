//! User-facing notices emitted by a session

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NotFound,
    Saved,
    SaveFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Destructive,
}

/// A short message for the author, shown as a toast or banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(kind: NoticeKind, severity: Severity, title: &str, description: &str) -> Self {
        Notice {
            kind,
            severity,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    pub fn not_found() -> Self {
        Notice::new(
            NoticeKind::NotFound,
            Severity::Destructive,
            "Template not found",
            "The template you're looking for doesn't exist.",
        )
    }

    pub fn saved() -> Self {
        Notice::new(
            NoticeKind::Saved,
            Severity::Info,
            "Template saved",
            "Your changes have been saved successfully.",
        )
    }

    pub fn save_failed() -> Self {
        Notice::new(
            NoticeKind::SaveFailed,
            Severity::Destructive,
            "Error saving template",
            "There was a problem saving your template.",
        )
    }
}

/// Receives notices from a session
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
