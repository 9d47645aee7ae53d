//! # Mailmake Registry
//!
//! Durable storage for mailmake templates:
//! - [`TemplateStore`] is the contract editors program against
//! - [`Registry`] implements it over any [`BlobStorage`] backend
//! - Drafts receive a generated `tpl_…` id on their first save
//! - Saving a known id updates the record in place
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mailmake_registry::{MemoryStorage, Registry, TemplateStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(MemoryStorage::new());
//!
//! let draft = registry
//!     .create_draft()
//!     .with_title("Welcome")
//!     .with_content("<mjml><mj-body></mj-body></mjml>");
//! let saved = registry.save(&draft).await?;
//!
//! let id = saved.id.id().expect("saved templates have an id");
//! let loaded = registry.get(id).await?;
//! assert_eq!(loaded.title, "Welcome");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod latency;
pub mod registry;
pub mod storage;
pub mod store;

pub use error::{RegistryError, Result};
pub use latency::Delayed;
pub use registry::Registry;
pub use storage::{BlobStorage, MemoryStorage, StorageError};
pub use store::TemplateStore;

#[cfg(feature = "fs")]
pub use storage::FileSystemStorage;
