//! Error types for the mailmake library
//!
//! Errors are organized by domain. Rendering failures are not part of this
//! hierarchy: a malformed template is an expected outcome of editing and is
//! reported as a [`RenderError`](crate::render::RenderError) value instead.

use std::fmt;
use thiserror::Error;

/// Main error type for the mailmake library
///
/// Lookups and persistence live in the registry crate, which reports missing
/// records and encoding failures with its own error type.
#[derive(Error, Debug)]
pub enum MailmakeError {
    /// Template identity errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Template-related errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template identifier: {value:?} - {reason}")]
    InvalidIdentifier { value: String, reason: String },
}

/// Rich diagnostic information attached to a rendered document
///
/// Warnings do not stop a render; they describe markup the compiler accepted
/// but that is unlikely to display the way the author meant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiagnosticInfo {
    /// The diagnostic message
    pub message: String,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Source location, when the diagnostic can be tied to one
    pub location: Option<SourceLocation>,
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Source location information for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
}

impl SourceLocation {
    /// Resolve a byte offset within `source` to a line/column pair
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = source[line_start..offset].chars().count() + 1;
        SourceLocation { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for DiagnosticInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
        }
    }
}

/// Shorthand result type for mailmake operations
pub type Result<T> = std::result::Result<T, MailmakeError>;

impl MailmakeError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MailmakeError::Template(TemplateError::InvalidIdentifier { value, .. }) => {
                format!("'{}' is not a valid template id", value)
            }
        }
    }
}
