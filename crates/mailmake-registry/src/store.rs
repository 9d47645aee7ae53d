//! The template store contract

use async_trait::async_trait;
use mailmake::{Template, TemplateId};

use crate::error::Result;

/// Sole authority over which templates exist and their canonical values
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// A fresh unsaved draft; nothing is written
    fn create_draft(&self) -> Template {
        Template::draft()
    }

    /// Look up a persisted template
    ///
    /// Fails with [`RegistryError::TemplateNotFound`](crate::RegistryError::TemplateNotFound)
    /// when no record has this id.
    async fn get(&self, id: &TemplateId) -> Result<Template>;

    /// Insert a draft or update a persisted template, returning the
    /// canonical record
    ///
    /// Drafts get a newly generated id and `created_at = updated_at = now`.
    /// Persisted templates keep their id and `created_at`; `updated_at`
    /// moves forward on every save.
    async fn save(&self, template: &Template) -> Result<Template>;

    /// All persisted templates, most recently updated first
    async fn list(&self) -> Result<Vec<Template>>;
}

#[async_trait]
impl<T: TemplateStore + ?Sized> TemplateStore for std::sync::Arc<T> {
    fn create_draft(&self) -> Template {
        (**self).create_draft()
    }

    async fn get(&self, id: &TemplateId) -> Result<Template> {
        (**self).get(id).await
    }

    async fn save(&self, template: &Template) -> Result<Template> {
        (**self).save(template).await
    }

    async fn list(&self) -> Result<Vec<Template>> {
        (**self).list().await
    }
}
