//! Live-preview rendering
//!
//! This module turns raw markup into a rendered email document. The markup
//! compiler is treated as a black box: whatever it does with malformed input,
//! including panicking, [`RenderPipeline::render`] hands back a
//! [`RenderError`] value and never unwinds into the caller.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::RenderCache;
use crate::document::Document;
use crate::error::SourceLocation;
use crate::mjml::MjmlCompiler;

/// A rendering failure with location information
///
/// `message` is always a non-empty, human-readable diagnostic suitable for
/// showing in place of the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderError {
    /// The error message
    pub message: String,
    /// Starting byte offset in the markup
    pub start: usize,
    /// Ending byte offset in the markup
    pub end: usize,
    /// Line and column of `start`, when known
    pub location: Option<SourceLocation>,
}

impl RenderError {
    /// An error that can not be tied to a position in the source
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        RenderError {
            message: if message.trim().is_empty() {
                "rendering failed".to_string()
            } else {
                message
            },
            start: 0,
            end: 0,
            location: None,
        }
    }

    /// An error covering `start..end` of `source`
    pub fn at(message: impl Into<String>, source: &str, start: usize, end: usize) -> Self {
        RenderError {
            start,
            end: end.max(start),
            location: Some(SourceLocation::from_offset(source, start)),
            ..RenderError::new(message)
        }
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RenderError {}

/// Successfully rendered markup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedOutput {
    /// HTML ready to be shown in a preview frame
    pub html: String,
    /// The structured document the HTML was produced from
    pub document: Document,
}

impl RenderedOutput {
    /// The output of blank markup
    pub fn empty() -> Self {
        RenderedOutput {
            html: String::new(),
            document: Document::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }
}

/// Result of a render call
pub type RenderResult = std::result::Result<RenderedOutput, RenderError>;

/// Capability that compiles markup into a structured document
///
/// Implementations should return a [`RenderError`] for malformed input, but
/// the pipeline tolerates implementations that panic instead.
pub trait MarkupCompiler: Send + Sync {
    fn compile(&self, markup: &str) -> std::result::Result<Document, RenderError>;
}

/// Maps markup text to a rendered document
///
/// Cloning is cheap; clones share the compiler and cache.
#[derive(Clone)]
pub struct RenderPipeline {
    compiler: Arc<dyn MarkupCompiler>,
    cache: Option<Arc<RenderCache>>,
}

impl RenderPipeline {
    /// A pipeline backed by the built-in MJML compiler
    pub fn new() -> Self {
        Self::with_compiler(Arc::new(MjmlCompiler::new()))
    }

    pub fn with_compiler(compiler: Arc<dyn MarkupCompiler>) -> Self {
        RenderPipeline {
            compiler,
            cache: None,
        }
    }

    /// Memoize up to `capacity` results; zero disables caching
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| Arc::new(RenderCache::new(capacity)));
        self
    }

    pub fn cache(&self) -> Option<&RenderCache> {
        self.cache.as_deref()
    }

    /// Render markup to a document
    ///
    /// Blank markup yields [`RenderedOutput::empty`]. Identical markup always
    /// yields an identical result.
    pub fn render(&self, markup: &str) -> RenderResult {
        if markup.trim().is_empty() {
            return Ok(RenderedOutput::empty());
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(markup) {
                debug!(bytes = markup.len(), "render cache hit");
                return hit;
            }
        }

        let result = self.render_uncached(markup);

        if let Some(cache) = &self.cache {
            cache.insert(markup, result.clone());
        }
        result
    }

    fn render_uncached(&self, markup: &str) -> RenderResult {
        let compiler = &self.compiler;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            compiler.compile(markup).map(|document| RenderedOutput {
                html: document.to_html(),
                document,
            })
        }));

        match outcome {
            Ok(Ok(output)) => {
                debug!(
                    bytes = markup.len(),
                    html_bytes = output.html.len(),
                    warnings = output.document.warnings.len(),
                    "rendered markup"
                );
                Ok(output)
            }
            Ok(Err(error)) => {
                debug!(%error, "markup failed to compile");
                Err(error)
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown failure".to_string());
                warn!(%reason, "markup compiler panicked");
                Err(RenderError::new(format!("Renderer crashed: {}", reason)))
            }
        }
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        RenderPipeline::new()
    }
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

/// Render markup with the default pipeline
pub fn render_markup(markup: &str) -> RenderResult {
    RenderPipeline::new().render(markup)
}
