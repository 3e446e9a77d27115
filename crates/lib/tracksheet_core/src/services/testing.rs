//! Store wrapper that injects failures into service tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::sheet::Sheet;
use crate::models::template::Template;
use crate::store::in_memory::InMemoryStore;
use crate::store::{SheetStore, StoreError, StoreResult, TemplateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Rows are deleted just before they are written back.
    VanishOnWrite,
    /// Every read fails as if the backend were down.
    Unavailable,
}

pub(crate) struct FaultyStore {
    pub inner: InMemoryStore,
    pub fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore, fault: Fault) -> Self {
        Self { inner, fault }
    }

    fn check_read(&self) -> StoreResult<()> {
        match self.fault {
            Fault::Unavailable => Err(StoreError::Unavailable("pool timed out".into())),
            Fault::VanishOnWrite => Ok(()),
        }
    }
}

#[async_trait]
impl SheetStore for FaultyStore {
    async fn get_sheet(&self, id: Uuid) -> StoreResult<Option<Sheet>> {
        self.check_read()?;
        self.inner.get_sheet(id).await
    }

    async fn list_sheets(
        &self,
        owner_id: Option<Uuid>,
        include_public: bool,
    ) -> StoreResult<Vec<Sheet>> {
        self.check_read()?;
        self.inner.list_sheets(owner_id, include_public).await
    }

    async fn insert_sheet(&self, sheet: &Sheet) -> StoreResult<()> {
        self.inner.insert_sheet(sheet).await
    }

    async fn update_sheet(&self, sheet: &Sheet) -> StoreResult<bool> {
        if self.fault == Fault::VanishOnWrite {
            self.inner.delete_sheet(sheet.id).await?;
        }
        self.inner.update_sheet(sheet).await
    }

    async fn delete_sheet(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_sheet(id).await
    }
}

#[async_trait]
impl TemplateStore for FaultyStore {
    async fn get_template(&self, id: Uuid) -> StoreResult<Option<Template>> {
        self.check_read()?;
        self.inner.get_template(id).await
    }

    async fn list_official_templates(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Template>> {
        self.check_read()?;
        self.inner
            .list_official_templates(query, category, limit)
            .await
    }

    async fn list_templates_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Template>> {
        self.check_read()?;
        self.inner.list_templates_owned_by(owner_id).await
    }

    async fn list_template_categories(&self) -> StoreResult<Vec<String>> {
        self.check_read()?;
        self.inner.list_template_categories().await
    }

    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        self.inner.insert_template(template).await
    }

    async fn update_template(&self, template: &Template) -> StoreResult<bool> {
        if self.fault == Fault::VanishOnWrite {
            self.inner.delete_template(template.id).await?;
        }
        self.inner.update_template(template).await
    }

    async fn delete_template(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_template(id).await
    }
}
