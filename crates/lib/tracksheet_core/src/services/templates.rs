//! Template operations.
//!
//! Official templates are catalog entities edited by admins; user-authored
//! templates follow the same ownership rules as sheets.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{ResourceError, ResourceResult, actor, enforce};
use crate::auth::ownership::{Action, CreateKind, authorize, authorize_create};
use crate::models::auth::SessionClaims;
use crate::models::sheet::Sheet;
use crate::models::template::{
    PopulatedTemplateProblem, Template, TemplateDraft, TemplatePatch, TemplateProblem,
};
use crate::store::{ProblemStore, SheetStore, TemplateStore};

/// Result cap for free-text search.
pub const SEARCH_LIMIT: u32 = 20;

fn not_found() -> ResourceError {
    ResourceError::NotFound("Template not found".into())
}

async fn load<S>(store: &S, id: Uuid) -> ResourceResult<Template>
where
    S: TemplateStore + ?Sized,
{
    store.get_template(id).await?.ok_or_else(not_found)
}

async fn save<S>(store: &S, template: &Template) -> ResourceResult<()>
where
    S: TemplateStore + ?Sized,
{
    if store.update_template(template).await? {
        Ok(())
    } else {
        Err(not_found())
    }
}

/// Official templates, optionally filtered.
pub async fn list_official<S>(
    store: &S,
    query: Option<&str>,
    category: Option<&str>,
) -> ResourceResult<Vec<Template>>
where
    S: TemplateStore + ?Sized,
{
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    Ok(store.list_official_templates(query, category, None).await?)
}

/// Free-text search over official templates, capped at [`SEARCH_LIMIT`].
pub async fn search<S>(store: &S, query: &str) -> ResourceResult<Vec<Template>>
where
    S: TemplateStore + ?Sized,
{
    let query = Some(query.trim()).filter(|q| !q.is_empty());
    Ok(store
        .list_official_templates(query, None, Some(SEARCH_LIMIT))
        .await?)
}

pub async fn categories<S>(store: &S) -> ResourceResult<Vec<String>>
where
    S: TemplateStore + ?Sized,
{
    Ok(store.list_template_categories().await?)
}

/// Templates authored by the caller.
pub async fn list_mine<S>(store: &S, claims: Option<&SessionClaims>) -> ResourceResult<Vec<Template>>
where
    S: TemplateStore + ?Sized,
{
    enforce(authorize_create(claims, CreateKind::Owned))?;
    let owner = actor(claims)?.actor_id();
    Ok(store.list_templates_owned_by(owner).await?)
}

pub async fn create<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    draft: TemplateDraft,
    now: DateTime<Utc>,
) -> ResourceResult<Template>
where
    S: TemplateStore + ?Sized,
{
    let kind = if draft.is_official {
        CreateKind::Catalog
    } else {
        CreateKind::Owned
    };
    enforce(authorize_create(claims, kind))?;
    let owner = actor(claims)?.actor_id();

    let template = Template::create(draft, Some(owner), now);
    template.validate().map_err(ResourceError::Validation)?;
    store.insert_template(&template).await?;
    info!(
        template_id = %template.id,
        official = template.is_official,
        problems = template.problem_count(),
        "created template"
    );
    Ok(template)
}

/// A readable template with its problems joined and sorted by order.
pub async fn get_populated<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
) -> ResourceResult<(Template, Vec<PopulatedTemplateProblem>)>
where
    S: TemplateStore + ProblemStore + ?Sized,
{
    let template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Read))?;

    let ids: Vec<Uuid> = template.problems.iter().map(|p| p.problem_id).collect();
    let mut found: HashMap<Uuid, _> = store
        .get_problems(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut entries = template.problems.clone();
    entries.sort_by_key(|p| p.order);
    let populated = entries
        .into_iter()
        .map(|entry| PopulatedTemplateProblem {
            problem: found.remove(&entry.problem_id),
            entry,
        })
        .collect();
    Ok((template, populated))
}

pub async fn update<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    patch: TemplatePatch,
    now: DateTime<Utc>,
) -> ResourceResult<Template>
where
    S: TemplateStore + ?Sized,
{
    actor(claims)?;
    let mut template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Write))?;

    template.apply(patch, now);
    template.validate().map_err(ResourceError::Validation)?;
    save(store, &template).await?;
    Ok(template)
}

pub async fn delete<S>(store: &S, claims: Option<&SessionClaims>, id: Uuid) -> ResourceResult<()>
where
    S: TemplateStore + ?Sized,
{
    actor(claims)?;
    let template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Delete))?;
    if !store.delete_template(id).await? {
        return Err(not_found());
    }
    info!(template_id = %id, "deleted template");
    Ok(())
}

/// Append problems the template does not already contain.
pub async fn add_problems<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    problems: Vec<TemplateProblem>,
    now: DateTime<Utc>,
) -> ResourceResult<Template>
where
    S: TemplateStore + ?Sized,
{
    actor(claims)?;
    let mut template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Write))?;
    if problems.is_empty() {
        return Err(ResourceError::Validation(
            "Problems array is required".into(),
        ));
    }

    if template.add_problems(problems, now) == 0 {
        return Err(ResourceError::Conflict(
            "No valid new problems to add".into(),
        ));
    }
    template.validate().map_err(ResourceError::Validation)?;
    save(store, &template).await?;
    Ok(template)
}

pub async fn remove_problem<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    problem_id: Uuid,
    now: DateTime<Utc>,
) -> ResourceResult<Template>
where
    S: TemplateStore + ?Sized,
{
    actor(claims)?;
    let mut template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Write))?;

    if !template.remove_problem(problem_id, now) {
        return Err(ResourceError::NotFound(
            "Problem not found in template".into(),
        ));
    }
    save(store, &template).await?;
    Ok(template)
}

/// Instantiate a private sheet owned by the caller from a readable template.
pub async fn create_sheet<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    now: DateTime<Utc>,
) -> ResourceResult<Sheet>
where
    S: TemplateStore + SheetStore + ?Sized,
{
    let template = load(store, id).await?;
    enforce(authorize(claims, &template, Action::Duplicate))?;
    let owner = actor(claims)?.actor_id();

    let sheet = Sheet::create(owner, template.instantiate(now), now);
    store.insert_sheet(&sheet).await?;
    info!(template_id = %id, sheet_id = %sheet.id, owner_id = %owner, "created sheet from template");
    Ok(sheet)
}
