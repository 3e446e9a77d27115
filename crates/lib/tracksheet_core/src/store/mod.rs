//! Persistence seams.
//!
//! Every component receives an explicitly constructed store handle; there is
//! no process-wide connection. Two implementations ship: [`postgres::PgStore`]
//! for production and [`in_memory::InMemoryStore`] for tests and local runs.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{Identity, NewIdentity, Profile, Role};
use crate::models::problem::{Problem, ProblemFilter, ProblemPage};
use crate::models::sheet::Sheet;
use crate::models::template::Template;

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached in time. Callers may retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Internal(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an atomic insert-if-absent keyed by email.
#[derive(Debug, Clone)]
pub enum Upserted {
    Created(Identity),
    Existing(Identity),
}

impl Upserted {
    pub fn into_identity(self) -> Identity {
        match self {
            Upserted::Created(i) | Upserted::Existing(i) => i,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }
}

/// Credential store. Emails are passed already normalized.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    async fn find_identity_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Insert a new identity. Fails with [`StoreError::Conflict`] if the email is taken.
    async fn insert_identity(&self, identity: NewIdentity) -> StoreResult<Identity>;

    /// Insert unless an identity with the same email exists; never overwrites.
    async fn insert_identity_if_absent(&self, identity: NewIdentity) -> StoreResult<Upserted>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Identity>>;

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<Identity>>;

    /// Soft lifecycle: role and activity flag only.
    async fn update_account(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> StoreResult<Option<Identity>>;
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn get_sheet(&self, id: Uuid) -> StoreResult<Option<Sheet>>;

    /// Sheets owned by `owner_id` plus, when `include_public`, every public sheet.
    /// Newest first.
    async fn list_sheets(
        &self,
        owner_id: Option<Uuid>,
        include_public: bool,
    ) -> StoreResult<Vec<Sheet>>;

    async fn insert_sheet(&self, sheet: &Sheet) -> StoreResult<()>;

    /// Replace a stored sheet. `Ok(false)` when it no longer exists.
    async fn update_sheet(&self, sheet: &Sheet) -> StoreResult<bool>;

    async fn delete_sheet(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, id: Uuid) -> StoreResult<Option<Template>>;

    /// Official templates, newest first, optionally narrowed by a case-insensitive
    /// substring on name or category, or an exact category.
    async fn list_official_templates(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Template>>;

    async fn list_templates_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Template>>;

    /// Distinct categories of official templates, sorted.
    async fn list_template_categories(&self) -> StoreResult<Vec<String>>;

    async fn insert_template(&self, template: &Template) -> StoreResult<()>;

    async fn update_template(&self, template: &Template) -> StoreResult<bool>;

    async fn delete_template(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn get_problem(&self, id: Uuid) -> StoreResult<Option<Problem>>;

    /// Active problem by slug.
    async fn get_problem_by_slug(&self, slug: &str) -> StoreResult<Option<Problem>>;

    async fn get_problems(&self, ids: &[Uuid]) -> StoreResult<Vec<Problem>>;

    async fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<ProblemPage>;

    async fn slug_exists(&self, slug: &str) -> StoreResult<bool>;

    /// Fails with [`StoreError::Conflict`] on a slug clash.
    async fn insert_problem(&self, problem: &Problem) -> StoreResult<()>;

    async fn update_problem(&self, problem: &Problem) -> StoreResult<bool>;

    async fn delete_problem(&self, id: Uuid) -> StoreResult<Option<Problem>>;
}

/// Everything the application persists.
pub trait Store: IdentityStore + SheetStore + TemplateStore + ProblemStore {}

impl<T> Store for T where T: IdentityStore + SheetStore + TemplateStore + ProblemStore {}

/// Shared handle passed to services and HTTP state.
pub type DynStore = Arc<dyn Store>;
