//! Storage backends for registry records

pub mod blob_storage;

#[cfg(feature = "fs")]
pub mod filesystem;

pub use blob_storage::{BlobStorage, MemoryStorage, StorageError};

#[cfg(feature = "fs")]
pub use filesystem::FileSystemStorage;
