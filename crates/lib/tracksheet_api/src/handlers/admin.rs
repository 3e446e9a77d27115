//! Account management for admins.

use axum::extract::{Path, State};
use tracing::info;
use tracksheet_core::auth::AuthError;
use tracksheet_core::auth::guard::CapabilityRequirement;

use super::{parse_id, require};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::session::Session;
use crate::models::{AccountUpdateRequest, IdentityView};

/// `PATCH /admin/users/{id}`: change an account's role or activity flag.
pub async fn update_account_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<AccountUpdateRequest>,
) -> AppResult<Json<IdentityView>> {
    let admin = require(session.claims(), &CapabilityRequirement::active_admin())?;
    let id = parse_id(&id, "user")?;
    if body.role.is_none() && body.is_active.is_none() {
        return Err(AppError::Validation("Nothing to update".into()));
    }
    let updated = state
        .store
        .update_account(id, body.role, body.is_active)
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    info!(
        admin_id = %admin.actor_id(),
        identity_id = %updated.id,
        role = %updated.role.as_str(),
        active = updated.is_active,
        "updated account"
    );
    Ok(Json(updated.into()))
}
