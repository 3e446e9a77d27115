//! In-memory store.
//!
//! Backed by concurrent maps. Suitable for tests and single-process local
//! runs; everything is lost on restart. Email and slug uniqueness are enforced
//! through index maps whose entry locks make insert-if-absent atomic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{
    IdentityStore, ProblemStore, SheetStore, StoreError, StoreResult, TemplateStore, Upserted,
};
use crate::models::auth::{Identity, NewIdentity, Profile, Role};
use crate::models::problem::{Problem, ProblemFilter, ProblemPage};
use crate::models::sheet::Sheet;
use crate::models::template::Template;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    identities: Arc<DashMap<Uuid, Identity>>,
    emails: Arc<DashMap<String, Uuid>>,
    sheets: Arc<DashMap<Uuid, Sheet>>,
    templates: Arc<DashMap<Uuid, Template>>,
    problems: Arc<DashMap<Uuid, Problem>>,
    slugs: Arc<DashMap<String, Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }
}

fn materialize(new: NewIdentity, now: DateTime<Utc>) -> Identity {
    Identity {
        id: Uuid::now_v7(),
        email: new.email,
        email_verified: new.email_verified,
        username: new.username,
        password_hash: new.password_hash,
        role: new.role,
        is_active: new.is_active,
        reputation: new.reputation,
        profile: new.profile,
        social_settings: new.social_settings,
        last_login: new.last_login,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let Some(id) = self.emails.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.identities.get(&id).map(|r| r.value().clone()))
    }

    async fn find_identity_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(self.identities.get(&id).map(|r| r.value().clone()))
    }

    async fn insert_identity(&self, identity: NewIdentity) -> StoreResult<Identity> {
        match self.emails.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("users_email_key".into())),
            Entry::Vacant(slot) => {
                let created = materialize(identity, Utc::now());
                self.identities.insert(created.id, created.clone());
                slot.insert(created.id);
                Ok(created)
            }
        }
    }

    async fn insert_identity_if_absent(&self, identity: NewIdentity) -> StoreResult<Upserted> {
        match self.emails.entry(identity.email.clone()) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                let found = self
                    .identities
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| StoreError::Internal(format!("dangling email index {id}")))?;
                Ok(Upserted::Existing(found))
            }
            Entry::Vacant(slot) => {
                let created = materialize(identity, Utc::now());
                self.identities.insert(created.id, created.clone());
                slot.insert(created.id);
                Ok(Upserted::Created(created))
            }
        }
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Identity>> {
        Ok(self.identities.get_mut(&id).map(|mut r| {
            r.last_login = Some(at);
            r.updated_at = at;
            r.clone()
        }))
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<Identity>> {
        Ok(self.identities.get_mut(&id).map(|mut r| {
            r.profile = profile;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn update_account(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> StoreResult<Option<Identity>> {
        Ok(self.identities.get_mut(&id).map(|mut r| {
            if let Some(role) = role {
                r.role = role;
            }
            if let Some(active) = is_active {
                r.is_active = active;
            }
            r.updated_at = Utc::now();
            r.clone()
        }))
    }
}

#[async_trait]
impl SheetStore for InMemoryStore {
    async fn get_sheet(&self, id: Uuid) -> StoreResult<Option<Sheet>> {
        Ok(self.sheets.get(&id).map(|r| r.value().clone()))
    }

    async fn list_sheets(
        &self,
        owner_id: Option<Uuid>,
        include_public: bool,
    ) -> StoreResult<Vec<Sheet>> {
        let mut sheets: Vec<Sheet> = self
            .sheets
            .iter()
            .filter(|r| Some(r.owner_id) == owner_id || (include_public && r.is_public))
            .map(|r| r.value().clone())
            .collect();
        sheets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sheets)
    }

    async fn insert_sheet(&self, sheet: &Sheet) -> StoreResult<()> {
        self.sheets.insert(sheet.id, sheet.clone());
        Ok(())
    }

    async fn update_sheet(&self, sheet: &Sheet) -> StoreResult<bool> {
        Ok(match self.sheets.get_mut(&sheet.id) {
            Some(mut stored) => {
                *stored = sheet.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_sheet(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.sheets.remove(&id).is_some())
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn get_template(&self, id: Uuid) -> StoreResult<Option<Template>> {
        Ok(self.templates.get(&id).map(|r| r.value().clone()))
    }

    async fn list_official_templates(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Template>> {
        let needle = query.map(str::to_lowercase);
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .filter(|r| r.is_official)
            .filter(|r| category.is_none_or(|c| r.category == c))
            .filter(|r| {
                needle.as_deref().is_none_or(|q| {
                    r.name.to_lowercase().contains(q) || r.category.to_lowercase().contains(q)
                })
            })
            .map(|r| r.value().clone())
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            templates.truncate(limit as usize);
        }
        Ok(templates)
    }

    async fn list_templates_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .filter(|r| r.owner_id == Some(owner_id))
            .map(|r| r.value().clone())
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn list_template_categories(&self) -> StoreResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .templates
            .iter()
            .filter(|r| r.is_official)
            .map(|r| r.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        self.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn update_template(&self, template: &Template) -> StoreResult<bool> {
        Ok(match self.templates.get_mut(&template.id) {
            Some(mut stored) => {
                *stored = template.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_template(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.templates.remove(&id).is_some())
    }
}

#[async_trait]
impl ProblemStore for InMemoryStore {
    async fn get_problem(&self, id: Uuid) -> StoreResult<Option<Problem>> {
        Ok(self.problems.get(&id).map(|r| r.value().clone()))
    }

    async fn get_problem_by_slug(&self, slug: &str) -> StoreResult<Option<Problem>> {
        let Some(id) = self.slugs.get(slug).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self
            .problems
            .get(&id)
            .filter(|r| r.is_active)
            .map(|r| r.value().clone()))
    }

    async fn get_problems(&self, ids: &[Uuid]) -> StoreResult<Vec<Problem>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.problems.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<ProblemPage> {
        let mut matching: Vec<Problem> = self
            .problems
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let problems = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok(ProblemPage { problems, total })
    }

    async fn slug_exists(&self, slug: &str) -> StoreResult<bool> {
        Ok(self.slugs.contains_key(slug))
    }

    async fn insert_problem(&self, problem: &Problem) -> StoreResult<()> {
        match self.slugs.entry(problem.slug.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("problems_slug_key".into())),
            Entry::Vacant(slot) => {
                self.problems.insert(problem.id, problem.clone());
                slot.insert(problem.id);
                Ok(())
            }
        }
    }

    async fn update_problem(&self, problem: &Problem) -> StoreResult<bool> {
        let Some(previous_slug) = self.problems.get(&problem.id).map(|r| r.slug.clone()) else {
            return Ok(false);
        };
        if previous_slug == problem.slug {
            return Ok(match self.problems.get_mut(&problem.id) {
                Some(mut stored) => {
                    *stored = problem.clone();
                    true
                }
                None => false,
            });
        }
        // Slug entry before row, the same lock order as insert.
        match self.slugs.entry(problem.slug.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("problems_slug_key".into())),
            Entry::Vacant(slot) => {
                let Some(mut stored) = self.problems.get_mut(&problem.id) else {
                    return Ok(false);
                };
                *stored = problem.clone();
                drop(stored);
                slot.insert(problem.id);
                self.slugs.remove(&previous_slug);
                Ok(true)
            }
        }
    }

    async fn delete_problem(&self, id: Uuid) -> StoreResult<Option<Problem>> {
        let removed = self.problems.remove(&id).map(|(_, p)| p);
        if let Some(p) = &removed {
            self.slugs.remove(&p.slug);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::FederatedProfile;

    fn federated(email: &str) -> NewIdentity {
        NewIdentity::federated(
            &FederatedProfile {
                email: email.into(),
                name: Some("N".into()),
                avatar: None,
                email_verified: false,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = InMemoryStore::new();
        store.insert_identity(federated("a@x.com")).await.unwrap();
        let err = store.insert_identity(federated("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.identity_count(), 1);
    }

    #[tokio::test]
    async fn insert_if_absent_returns_existing_untouched() {
        let store = InMemoryStore::new();
        let first = store
            .insert_identity_if_absent(federated("a@x.com"))
            .await
            .unwrap();
        assert!(first.was_created());
        let first = first.into_identity();

        let mut other = federated("a@x.com");
        other.profile.name = Some("Overwritten?".into());
        let second = store.insert_identity_if_absent(other).await.unwrap();
        assert!(!second.was_created());
        let second = second.into_identity();
        assert_eq!(second.id, first.id);
        assert_eq!(second.profile.name.as_deref(), Some("N"));
    }

    #[tokio::test]
    async fn concurrent_insert_if_absent_creates_one_identity() {
        let store = InMemoryStore::new();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_identity_if_absent(federated("new@x.com"))
                        .await
                        .unwrap()
                        .into_identity()
                        .id
                })
            })
            .collect();
        let ids = futures::future::join_all(tasks).await;
        let first = ids[0].as_ref().unwrap();
        assert!(ids.iter().all(|id| id.as_ref().unwrap() == first));
        assert_eq!(store.identity_count(), 1);
    }

    fn problem(slug: &str) -> Problem {
        let now = Utc::now();
        Problem {
            id: Uuid::now_v7(),
            title: "Two Sum".into(),
            slug: slug.into(),
            description: "d".into(),
            difficulty: Default::default(),
            category: "Arrays".into(),
            tags: vec![],
            companies: vec![],
            platform_links: Default::default(),
            editorial: None,
            hints: vec![],
            constraints: None,
            examples: vec![],
            total_attempts: 0,
            total_solved: 0,
            average_rating: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn problem_slug_changes_keep_index_consistent() {
        let store = InMemoryStore::new();
        let mut p = problem("two-sum");
        store.insert_problem(&p).await.unwrap();
        p.slug = "two-sum-ii".into();
        assert!(store.update_problem(&p).await.unwrap());
        assert!(!store.slug_exists("two-sum").await.unwrap());
        assert!(store.get_problem_by_slug("two-sum-ii").await.unwrap().is_some());

        store.delete_problem(p.id).await.unwrap();
        assert!(!store.slug_exists("two-sum-ii").await.unwrap());
    }

    #[tokio::test]
    async fn renaming_a_missing_problem_claims_no_slug() {
        let store = InMemoryStore::new();
        let mut p = problem("two-sum");
        store.insert_problem(&p).await.unwrap();
        store.delete_problem(p.id).await.unwrap();
        p.slug = "two-sum-ii".into();
        assert!(!store.update_problem(&p).await.unwrap());
        assert!(!store.slug_exists("two-sum-ii").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rename_racing_delete_leaves_no_orphan_slug() {
        let store = InMemoryStore::new();
        for round in 0..64 {
            let mut p = problem(&format!("p-{round}"));
            store.insert_problem(&p).await.unwrap();
            p.slug = format!("p-{round}-renamed");
            let id = p.id;

            let renamer = {
                let store = store.clone();
                tokio::spawn(async move { store.update_problem(&p).await.unwrap() })
            };
            let deleter = {
                let store = store.clone();
                tokio::spawn(async move { store.delete_problem(id).await.unwrap() })
            };
            renamer.await.unwrap();
            deleter.await.unwrap();
        }
        assert!(store.problems.is_empty());
        assert!(store.slugs.is_empty());
    }
}
