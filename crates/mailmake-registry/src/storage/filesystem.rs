//! Filesystem-backed blob storage

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::blob_storage::{BlobStorage, StorageError, validate_key};

/// Stores each key as a file below a root directory
///
/// Writes go to a temporary sibling file that is renamed into place, so a
/// reader never observes a partially written value.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    /// Create a storage rooted at `root`; the directory is created lazily
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Collect every key below the root
    async fn walk(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(backend("Failed to read directory", &dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| backend("Failed to read directory entry", &dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| backend("Failed to stat", &path, e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    // In-flight writes
                    if !key.contains(".tmp-") {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(keys)
    }
}

fn backend(action: &str, path: &Path, error: std::io::Error) -> StorageError {
    StorageError::Backend(format!("{} {}: {}", action, path.display(), error))
}

#[async_trait]
impl BlobStorage for FileSystemStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| backend("Failed to create directory", parent, e))?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(format!(".tmp-{}", uuid::Uuid::new_v4().simple()));
        let temp = PathBuf::from(temp);

        fs::write(&temp, &data)
            .await
            .map_err(|e| backend("Failed to write", &temp, e))?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(backend("Failed to move into place", &path, e));
        }

        debug!(key, bytes = data.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(backend("Failed to read", &path, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| backend("Failed to stat", &path, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend("Failed to delete", &path, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = self.walk().await?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_filesystem_storage_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());

        storage.put("templates/tpl_1.json", b"one".to_vec()).await.unwrap();
        assert_eq!(storage.get("templates/tpl_1.json").await.unwrap(), b"one");
        assert!(storage.exists("templates/tpl_1.json").await.unwrap());

        // Overwrite in place
        storage.put("templates/tpl_1.json", b"two".to_vec()).await.unwrap();
        assert_eq!(storage.get("templates/tpl_1.json").await.unwrap(), b"two");

        storage.delete("templates/tpl_1.json").await.unwrap();
        assert!(matches!(
            storage.get("templates/tpl_1.json").await,
            Err(StorageError::NotFound(_))
        ));
        // Deleting twice is fine
        storage.delete("templates/tpl_1.json").await.unwrap();
    }

    #[tokio::test]
    async fn test_filesystem_storage_list() {
        let dir = tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().join("data"));

        // Listing before anything was written
        assert!(storage.list("templates/").await.unwrap().is_empty());

        storage.put("templates/b.json", b"b".to_vec()).await.unwrap();
        storage.put("templates/a.json", b"a".to_vec()).await.unwrap();
        storage.put("other/c.json", b"c".to_vec()).await.unwrap();

        assert_eq!(
            storage.list("templates/").await.unwrap(),
            vec!["templates/a.json".to_string(), "templates/b.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_filesystem_storage_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        assert!(matches!(
            storage.put("../outside", Vec::new()).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
