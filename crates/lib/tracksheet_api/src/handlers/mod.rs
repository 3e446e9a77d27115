//! Request handlers.

pub mod admin;
pub mod auth;
pub mod problems;
pub mod sheets;
pub mod templates;

use tracksheet_core::auth::guard::{self, CapabilityRequirement};
use tracksheet_core::models::auth::SessionClaims;
use tracksheet_core::services::enforce;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Parse a path id, reporting which kind of id was malformed.
pub(crate) fn parse_id(raw: &str, kind: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {kind} ID")))
}

/// Run the capability guard and return the caller's claims on a permit.
pub(crate) fn require<'a>(
    claims: Option<&'a SessionClaims>,
    requirement: &CapabilityRequirement,
) -> AppResult<&'a SessionClaims> {
    enforce(guard::check(claims, requirement).into())?;
    claims.ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))
}
