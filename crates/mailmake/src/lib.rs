//! Mailmake turns MJML email templates into previewable HTML and models the
//! templates an editor works on.

pub mod cache;
pub mod document;
pub mod error;
pub mod mjml;
pub mod render;
pub mod template;

// Re-export core types
pub use cache::RenderCache;
pub use document::{Document, ElementKind, Node};
pub use error::{
    DiagnosticInfo, DiagnosticSeverity, MailmakeError, Result, SourceLocation, TemplateError,
};
pub use mjml::MjmlCompiler;
pub use render::{
    MarkupCompiler, RenderError, RenderPipeline, RenderResult, RenderedOutput, render_markup,
};
pub use template::{
    DEFAULT_TITLE, NEW_TEMPLATE_SEGMENT, Template, TemplateBuilder, TemplateId, TemplateIdentity,
};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
