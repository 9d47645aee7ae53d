//! Template registry over a blob storage backend

use async_trait::async_trait;
use mailmake::{Template, TemplateId, TemplateIdentity};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::storage::{BlobStorage, StorageError};
use crate::store::TemplateStore;

const TEMPLATE_PREFIX: &str = "templates/";

/// Stores each template as a JSON record at `templates/<id>.json`
pub struct Registry<S: BlobStorage> {
    storage: Arc<S>,
    /// Serializes read-modify-write cycles in `save`
    write_lock: Mutex<()>,
}

impl<S: BlobStorage> Registry<S> {
    /// Create a registry over `storage`
    pub fn new(storage: S) -> Self {
        Self::with_shared_storage(Arc::new(storage))
    }

    pub fn with_shared_storage(storage: Arc<S>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn record_key(id: &TemplateId) -> String {
        format!("{}{}.json", TEMPLATE_PREFIX, id)
    }

    fn generate_id() -> Result<TemplateId> {
        Ok(TemplateId::new(format!(
            "tpl_{}",
            uuid::Uuid::new_v4().simple()
        ))?)
    }

    /// Pick an id that no stored record uses
    async fn allocate_id(&self) -> Result<TemplateId> {
        loop {
            let id = Self::generate_id()?;
            if !self.storage.exists(&Self::record_key(&id)).await? {
                return Ok(id);
            }
        }
    }

    async fn load(&self, id: &TemplateId) -> Result<Template> {
        let bytes = self
            .storage
            .get(&Self::record_key(id))
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => RegistryError::TemplateNotFound(id.to_string()),
                other => RegistryError::Storage(other),
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl<S: BlobStorage + 'static> TemplateStore for Registry<S> {
    async fn get(&self, id: &TemplateId) -> Result<Template> {
        debug!(%id, "loading template");
        self.load(id).await
    }

    async fn save(&self, template: &Template) -> Result<Template> {
        let _guard = self.write_lock.lock().await;
        let now = OffsetDateTime::now_utc();

        let (id, created_at, updated_at) = match &template.id {
            TemplateIdentity::Unsaved => (self.allocate_id().await?, now, now),
            TemplateIdentity::Persisted(id) => {
                let existing = self.load(id).await?;
                let updated_at = if now > existing.updated_at {
                    now
                } else {
                    existing.updated_at + Duration::microseconds(1)
                };
                (id.clone(), existing.created_at, updated_at)
            }
        };

        let record = Template {
            id: TemplateIdentity::Persisted(id.clone()),
            title: template.title.clone(),
            content: template.content.clone(),
            created_at,
            updated_at,
        };

        // Serialize fully before touching storage so a failure leaves the
        // previous record intact
        let bytes = serde_json::to_vec_pretty(&record)?;
        self.storage.put(&Self::record_key(&id), bytes).await?;

        info!(
            %id,
            inserted = template.id.is_unsaved(),
            bytes = record.content.len(),
            "saved template"
        );
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Template>> {
        let keys = self.storage.list(TEMPLATE_PREFIX).await?;
        let mut templates = Vec::with_capacity(keys.len());
        for key in keys {
            let bytes = match self.storage.get(&key).await {
                Ok(bytes) => bytes,
                // Removed between listing and reading
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            templates.push(serde_json::from_slice::<Template>(&bytes)?);
        }
        templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(templates)
    }
}
