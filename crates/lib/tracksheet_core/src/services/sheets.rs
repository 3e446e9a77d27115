//! Sheet operations.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ResourceError, ResourceResult, actor, enforce};
use crate::auth::ownership::{Action, CreateKind, authorize, authorize_create};
use crate::models::auth::SessionClaims;
use crate::models::sheet::{MAX_NAME_LEN, ProgressUpdate, Sheet, SheetDraft, SheetPatch};
use crate::store::SheetStore;

const MAX_DESCRIPTION_LEN: usize = 500;

fn not_found() -> ResourceError {
    ResourceError::NotFound("Sheet not found".into())
}

fn validate_text(name: Option<&str>, description: Option<&str>) -> ResourceResult<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(ResourceError::Validation("Sheet name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ResourceError::Validation(format!(
                "Sheet name must be at most {MAX_NAME_LEN} characters"
            )));
        }
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(ResourceError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Sheets visible to the caller, newest first.
///
/// Anonymous callers see public sheets. Signed-in callers see their own plus
/// all public sheets, or only their own with `mine`.
pub async fn list<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    mine: bool,
) -> ResourceResult<Vec<Sheet>>
where
    S: SheetStore + ?Sized,
{
    let sheets = match (claims, mine) {
        (None, true) => return Err(ResourceError::Unauthenticated),
        (None, false) => store.list_sheets(None, true).await?,
        (Some(c), mine) => store.list_sheets(Some(c.actor_id()), !mine).await?,
    };
    Ok(sheets
        .into_iter()
        .filter(|s| authorize(claims, s, Action::Read).is_permitted())
        .collect())
}

pub async fn create<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    draft: SheetDraft,
    now: DateTime<Utc>,
) -> ResourceResult<Sheet>
where
    S: SheetStore + ?Sized,
{
    enforce(authorize_create(claims, CreateKind::Owned))?;
    let owner = actor(claims)?.actor_id();
    validate_text(Some(&draft.name), draft.description.as_deref())?;

    let mut draft = draft;
    draft.name = draft.name.trim().to_string();
    let sheet = Sheet::create(owner, draft, now);
    store.insert_sheet(&sheet).await?;
    info!(sheet_id = %sheet.id, owner_id = %owner, "created sheet");
    Ok(sheet)
}

pub async fn get<S>(store: &S, claims: Option<&SessionClaims>, id: Uuid) -> ResourceResult<Sheet>
where
    S: SheetStore + ?Sized,
{
    let sheet = store.get_sheet(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &sheet, Action::Read))?;
    Ok(sheet)
}

/// Owner edit. Returns the stored result.
pub async fn update<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    patch: SheetPatch,
    now: DateTime<Utc>,
) -> ResourceResult<Sheet>
where
    S: SheetStore + ?Sized,
{
    actor(claims)?;
    let mut sheet = store.get_sheet(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &sheet, Action::Write))?;
    validate_text(patch.name.as_deref(), patch.description.as_deref())?;

    sheet.apply(patch, now);
    if !store.update_sheet(&sheet).await? {
        debug!(sheet_id = %id, "sheet vanished before update");
        return Err(not_found());
    }
    Ok(sheet)
}

pub async fn delete<S>(store: &S, claims: Option<&SessionClaims>, id: Uuid) -> ResourceResult<()>
where
    S: SheetStore + ?Sized,
{
    actor(claims)?;
    let sheet = store.get_sheet(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &sheet, Action::Delete))?;
    if !store.delete_sheet(id).await? {
        return Err(not_found());
    }
    info!(sheet_id = %id, "deleted sheet");
    Ok(())
}

/// Copy a readable sheet into the caller's collection.
pub async fn duplicate<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    id: Uuid,
    now: DateTime<Utc>,
) -> ResourceResult<Sheet>
where
    S: SheetStore + ?Sized,
{
    let source = store.get_sheet(id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &source, Action::Duplicate))?;
    let owner = actor(claims)?.actor_id();

    let copy = source.duplicate_for(owner, now);
    store.insert_sheet(&copy).await?;
    info!(source_id = %id, sheet_id = %copy.id, owner_id = %owner, "duplicated sheet");
    Ok(copy)
}

/// Record progress on one problem of an owned sheet.
pub async fn update_progress<S>(
    store: &S,
    claims: Option<&SessionClaims>,
    sheet_id: Uuid,
    problem_id: Uuid,
    update: ProgressUpdate,
    now: DateTime<Utc>,
) -> ResourceResult<Sheet>
where
    S: SheetStore + ?Sized,
{
    actor(claims)?;
    let mut sheet = store.get_sheet(sheet_id).await?.ok_or_else(not_found)?;
    enforce(authorize(claims, &sheet, Action::Write))?;
    update.validate().map_err(ResourceError::Validation)?;

    let entry = sheet
        .problem_mut(problem_id)
        .ok_or_else(|| ResourceError::NotFound("Problem not found in sheet".into()))?;
    update.apply(entry, now);
    sheet.updated_at = now;
    if !store.update_sheet(&sheet).await? {
        return Err(not_found());
    }
    Ok(sheet)
}
