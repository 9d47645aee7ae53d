//! Integration tests for mailmake-registry

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mailmake::{DEFAULT_TITLE, Template, TemplateId, TemplateIdentity};
use mailmake_registry::*;
use tempfile::tempdir;

const WELCOME: &str = "<mjml><mj-body><mj-section><mj-column><mj-text>Welcome</mj-text></mj-column></mj-section></mj-body></mjml>";

fn persisted_id(template: &Template) -> TemplateId {
    template.id.id().cloned().expect("saved template has an id")
}

#[tokio::test]
async fn test_draft_is_not_written() {
    let registry = Registry::new(MemoryStorage::new());

    let draft = registry.create_draft();
    assert!(draft.is_draft());
    assert_eq!(draft.title, DEFAULT_TITLE);
    assert_eq!(draft.content, "");

    assert!(registry.storage().is_empty());
    assert!(registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_save_assigns_identity() {
    let registry = Registry::new(MemoryStorage::new());

    let draft = registry
        .create_draft()
        .with_title("Welcome")
        .with_content(WELCOME);
    let saved = registry.save(&draft).await.unwrap();

    let id = persisted_id(&saved);
    assert!(id.as_str().starts_with("tpl_"));
    assert_eq!(saved.title, "Welcome");
    assert_eq!(saved.content, WELCOME);
    assert_eq!(saved.created_at, saved.updated_at);

    let loaded = registry.get(&id).await.unwrap();
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn test_resave_keeps_identity_and_advances_timestamp() {
    let registry = Registry::new(MemoryStorage::new());

    let first = registry.save(&registry.create_draft()).await.unwrap();
    let id = persisted_id(&first);

    let second = registry
        .save(&first.clone().with_title("Renamed"))
        .await
        .unwrap();
    let third = registry
        .save(&second.clone().with_content(WELCOME))
        .await
        .unwrap();

    assert_eq!(persisted_id(&second), id);
    assert_eq!(persisted_id(&third), id);
    assert_eq!(third.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert!(third.updated_at > second.updated_at);
    assert_eq!(third.title, "Renamed");

    // Still one record
    assert_eq!(registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let registry = Registry::new(MemoryStorage::new());
    let id = TemplateId::new("tpl_missing").unwrap();

    let err = registry.get(&id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, RegistryError::TemplateNotFound(ref missing) if missing == "tpl_missing"));
}

#[tokio::test]
async fn test_saving_unknown_persisted_id_fails() {
    let registry = Registry::new(MemoryStorage::new());
    let orphan = Template::builder()
        .id(TemplateId::new("tpl_ghost").unwrap())
        .title("Ghost")
        .build();

    let err = registry.save(&orphan).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(registry.storage().is_empty());
}

#[tokio::test]
async fn test_two_drafts_get_distinct_ids() {
    let registry = Registry::new(MemoryStorage::new());

    let a = registry.save(&registry.create_draft()).await.unwrap();
    let b = registry.save(&registry.create_draft()).await.unwrap();

    assert_ne!(persisted_id(&a), persisted_id(&b));
    assert_eq!(registry.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let registry = Registry::new(MemoryStorage::new());

    let older = registry
        .save(&registry.create_draft().with_title("Older"))
        .await
        .unwrap();
    let newer = registry
        .save(&registry.create_draft().with_title("Newer"))
        .await
        .unwrap();
    // Touch the older one so it moves to the front
    registry.save(&older.clone().with_content(WELCOME)).await.unwrap();

    let titles: Vec<_> = registry
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Older".to_string(), "Newer".to_string()]);
    assert_ne!(persisted_id(&older), persisted_id(&newer));
}

#[tokio::test]
async fn test_filesystem_registry_survives_reopen() {
    let dir = tempdir().unwrap();

    let saved = {
        let registry = Registry::new(FileSystemStorage::new(dir.path()));
        registry
            .save(&registry.create_draft().with_title("Persistent").with_content(WELCOME))
            .await
            .unwrap()
    };

    let reopened = Registry::new(FileSystemStorage::new(dir.path()));
    let loaded = reopened.get(&persisted_id(&saved)).await.unwrap();
    assert_eq!(loaded, saved);
    assert!(dir
        .path()
        .join("templates")
        .join(format!("{}.json", persisted_id(&saved)))
        .exists());
}

/// Storage whose writes always fail
struct ReadOnlyStorage(MemoryStorage);

#[async_trait]
impl BlobStorage for ReadOnlyStorage {
    async fn put(&self, _key: &str, _data: Vec<u8>) -> std::result::Result<(), StorageError> {
        Err(StorageError::Backend("read-only".into()))
    }

    async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, StorageError> {
        self.0.get(key).await
    }

    async fn exists(&self, key: &str) -> std::result::Result<bool, StorageError> {
        self.0.exists(key).await
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
        self.0.delete(key).await
    }

    async fn list(&self, prefix: &str) -> std::result::Result<Vec<String>, StorageError> {
        self.0.list(prefix).await
    }
}

#[tokio::test]
async fn test_failed_write_leaves_nothing_behind() {
    let registry = Registry::new(ReadOnlyStorage(MemoryStorage::new()));

    let err = registry.save(&registry.create_draft()).await.unwrap_err();
    assert!(matches!(err, RegistryError::Storage(StorageError::Backend(_))));
    assert!(registry.list().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delayed_store_waits_before_saving() {
    let store = Arc::new(Delayed::new(
        Registry::new(MemoryStorage::new()),
        Duration::from_millis(500),
    ));

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.save(&store.create_draft()).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.inner().storage().is_empty());

    let saved = pending.await.unwrap().unwrap();
    assert!(matches!(saved.id, TemplateIdentity::Persisted(_)));
    assert_eq!(store.inner().storage().len(), 1);
}
