//! Error types for the mailmake registry

use thiserror::Error;

pub use crate::storage::blob_storage::StorageError;

/// Registry-specific errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Mailmake error: {0}")]
    Mailmake(#[from] mailmake::MailmakeError),
}

impl RegistryError {
    /// Whether the error means the requested template does not exist
    ///
    /// This is a terminal outcome for the request, not a transient failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::TemplateNotFound(_))
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
