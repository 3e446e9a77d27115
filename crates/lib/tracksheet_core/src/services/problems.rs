//! Problem catalog operations.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ResourceError, ResourceResult, enforce};
use crate::auth::ownership::{Action, CreateKind, authorize, authorize_create};
use crate::models::auth::SessionClaims;
use crate::models::problem::{
    Problem, ProblemDraft, ProblemFilter, ProblemPage, ProblemPatch, slugify,
};
use crate::store::{ProblemStore, StoreError};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Attempts at a free `-N` suffix before giving up on a generated slug.
const MAX_SLUG_ATTEMPTS: u32 = 50;

const SLUG_TAKEN: &str = "Problem with this slug already exists";

fn not_found() -> ResourceError {
    ResourceError::NotFound("Problem not found".into())
}

/// One page of active problems. Page and limit are clamped to sane bounds.
pub async fn list<S>(store: &S, mut filter: ProblemFilter) -> ResourceResult<ProblemPage>
where
    S: ProblemStore + ?Sized,
{
    filter.page = filter.page.max(1);
    filter.limit = match filter.limit {
        0 => DEFAULT_PAGE_LIMIT,
        n => n.min(MAX_PAGE_LIMIT),
    };
    Ok(store.list_problems(&filter).await?)
}

/// Look up by id, or by slug among active problems.
pub async fn get<S>(store: &S, id_or_slug: &str) -> ResourceResult<Problem>
where
    S: ProblemStore + ?Sized,
{
    let problem = match Uuid::parse_str(id_or_slug) {
        Ok(id) => store.get_problem(id).await?,
        Err(_) => store.get_problem_by_slug(id_or_slug).await?,
    };
    problem.ok_or_else(not_found)
}

/// Add a problem to the catalog.
///
/// An explicit slug must be free. A slug generated from the title takes the
/// first free candidate of `base`, `base-1`, `base-2`, ...; the store's unique
/// index arbitrates concurrent creators.
pub async fn create<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    draft: ProblemDraft,
    now: DateTime<Utc>,
) -> ResourceResult<Problem>
where
    S: ProblemStore + ?Sized,
{
    enforce(authorize_create(claims, CreateKind::Catalog))?;

    let missing = draft.missing_fields();
    if !missing.is_empty() {
        return Err(ResourceError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if let Some(slug) = draft.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let slug = slug.to_lowercase();
        let problem = Problem::from_draft(draft, slug, now);
        return match store.insert_problem(&problem).await {
            Ok(()) => {
                info!(problem_id = %problem.id, slug = %problem.slug, "created problem");
                Ok(problem)
            }
            Err(StoreError::Conflict(_)) => Err(ResourceError::Conflict(SLUG_TAKEN.into())),
            Err(e) => Err(e.into()),
        };
    }

    let base = slugify(&draft.title);
    if base.is_empty() {
        return Err(ResourceError::Validation(
            "Title must contain letters or digits".into(),
        ));
    }
    let mut problem = Problem::from_draft(draft, base.clone(), now);
    let mut suffix = 0;
    loop {
        if !store.slug_exists(&problem.slug).await? {
            match store.insert_problem(&problem).await {
                Ok(()) => {
                    info!(problem_id = %problem.id, slug = %problem.slug, "created problem");
                    return Ok(problem);
                }
                Err(StoreError::Conflict(_)) => {
                    debug!(slug = %problem.slug, "slug taken concurrently, trying next");
                }
                Err(e) => return Err(e.into()),
            }
        }
        suffix += 1;
        if suffix > MAX_SLUG_ATTEMPTS {
            return Err(ResourceError::Conflict(SLUG_TAKEN.into()));
        }
        problem.slug = format!("{base}-{suffix}");
    }
}

pub async fn update<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    patch: ProblemPatch,
    now: DateTime<Utc>,
) -> ResourceResult<Problem>
where
    S: ProblemStore + ?Sized,
{
    let mut problem = store.get_problem(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &problem, Action::Write))?;

    problem.apply(patch, now);
    if problem.title.is_empty() || problem.slug.is_empty() {
        return Err(ResourceError::Validation(
            "Title and slug must not be empty".into(),
        ));
    }
    match store.update_problem(&problem).await {
        Ok(true) => Ok(problem),
        Ok(false) => Err(not_found()),
        Err(StoreError::Conflict(_)) => Err(ResourceError::Conflict(SLUG_TAKEN.into())),
        Err(e) => Err(e.into()),
    }
}

/// Remove a problem, returning what was deleted.
pub async fn delete<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
) -> ResourceResult<Problem>
where
    S: ProblemStore + ?Sized,
{
    let problem = store.get_problem(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &problem, Action::Delete))?;
    let deleted = store.delete_problem(id).await?.ok_or_else(not_found)?;
    info!(problem_id = %id, "deleted problem");
    Ok(deleted)
}
