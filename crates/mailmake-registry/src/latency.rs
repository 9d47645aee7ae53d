//! Artificial store latency

use async_trait::async_trait;
use mailmake::{Template, TemplateId};
use std::time::Duration;

use crate::error::Result;
use crate::store::TemplateStore;

/// Wraps a store and delays every `save` by a fixed amount
///
/// Useful for exercising editors against a slow backend.
pub struct Delayed<T> {
    inner: T,
    latency: Duration,
}

impl<T: TemplateStore> Delayed<T> {
    pub fn new(inner: T, latency: Duration) -> Self {
        Self { inner, latency }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: TemplateStore> TemplateStore for Delayed<T> {
    async fn get(&self, id: &TemplateId) -> Result<Template> {
        self.inner.get(id).await
    }

    async fn save(&self, template: &Template) -> Result<Template> {
        tokio::time::sleep(self.latency).await;
        self.inner.save(template).await
    }

    async fn list(&self) -> Result<Vec<Template>> {
        self.inner.list().await
    }
}
