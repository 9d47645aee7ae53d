//! Template model for MJML email documents

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{MailmakeError, Result, TemplateError};

/// Title given to drafts until the author names them
pub const DEFAULT_TITLE: &str = "Untitled Template";

/// Route segment that addresses a template which has not been saved yet
pub const NEW_TEMPLATE_SEGMENT: &str = "new";

/// Unique identifier of a persisted template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateId(String);

impl TemplateId {
    /// Validate and wrap an identifier
    ///
    /// The `"new"` route segment is never a valid id, so a draft can not be
    /// stored under it.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("identifier is empty")
        } else if value == NEW_TEMPLATE_SEGMENT {
            Some("identifier is reserved for unsaved drafts")
        } else if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Some("identifier may only contain ASCII letters, digits, '_' and '-'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(MailmakeError::Template(TemplateError::InvalidIdentifier {
                value,
                reason: reason.to_string(),
            })),
            None => Ok(TemplateId(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TemplateId {
    type Error = MailmakeError;

    fn try_from(value: String) -> Result<Self> {
        TemplateId::new(value)
    }
}

impl From<TemplateId> for String {
    fn from(id: TemplateId) -> Self {
        id.0
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a template has been assigned a persisted identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<TemplateId>", into = "Option<TemplateId>")]
pub enum TemplateIdentity {
    /// A draft that has never been saved
    #[default]
    Unsaved,
    /// A record the store knows about
    Persisted(TemplateId),
}

impl TemplateIdentity {
    pub fn is_unsaved(&self) -> bool {
        matches!(self, TemplateIdentity::Unsaved)
    }

    /// The persisted id, if any
    pub fn id(&self) -> Option<&TemplateId> {
        match self {
            TemplateIdentity::Unsaved => None,
            TemplateIdentity::Persisted(id) => Some(id),
        }
    }
}

impl From<Option<TemplateId>> for TemplateIdentity {
    fn from(id: Option<TemplateId>) -> Self {
        match id {
            Some(id) => TemplateIdentity::Persisted(id),
            None => TemplateIdentity::Unsaved,
        }
    }
}

impl From<TemplateIdentity> for Option<TemplateId> {
    fn from(identity: TemplateIdentity) -> Self {
        match identity {
            TemplateIdentity::Unsaved => None,
            TemplateIdentity::Persisted(id) => Some(id),
        }
    }
}

impl From<TemplateId> for TemplateIdentity {
    fn from(id: TemplateId) -> Self {
        TemplateIdentity::Persisted(id)
    }
}

/// Parses an editor route segment: `"new"` opens a draft, anything else
/// must be a valid [`TemplateId`].
impl FromStr for TemplateIdentity {
    type Err = MailmakeError;

    fn from_str(segment: &str) -> Result<Self> {
        if segment == NEW_TEMPLATE_SEGMENT {
            Ok(TemplateIdentity::Unsaved)
        } else {
            TemplateId::new(segment).map(TemplateIdentity::Persisted)
        }
    }
}

impl fmt::Display for TemplateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateIdentity::Unsaved => f.write_str(NEW_TEMPLATE_SEGMENT),
            TemplateIdentity::Persisted(id) => write!(f, "{}", id),
        }
    }
}

/// An MJML email template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Persisted identity, `null` on the wire for drafts
    #[serde(default)]
    pub id: TemplateIdentity,

    /// Human-readable label
    pub title: String,

    /// Raw MJML source
    pub content: String,

    /// Creation timestamp
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Last update timestamp
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Template {
    /// Create a fresh draft with the default title and empty content
    pub fn draft() -> Self {
        let now = OffsetDateTime::now_utc();
        Template {
            id: TemplateIdentity::Unsaved,
            title: DEFAULT_TITLE.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new template builder
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::new()
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_unsaved()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the markup content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Default for Template {
    fn default() -> Self {
        Template::draft()
    }
}

/// Builder for creating templates with a fluent API
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    id: TemplateIdentity,
    title: Option<String>,
    content: Option<String>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        TemplateBuilder::default()
    }

    /// Set the identity; unset means an unsaved draft
    pub fn id(mut self, id: impl Into<TemplateIdentity>) -> Self {
        self.id = id.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Build the template
    ///
    /// The title is a free label; a missing one falls back to the default.
    pub fn build(self) -> Template {
        let now = OffsetDateTime::now_utc();
        Template {
            id: self.id,
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: self.content.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}
