//! Error types for editor sessions

use mailmake_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("The session is not editing a template")]
    NotEditing,

    #[error("Failed to load template: {0}")]
    Load(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
