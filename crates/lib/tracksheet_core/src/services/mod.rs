//! Resource services.
//!
//! Each operation loads the resource, asks the guard or the ownership
//! authorizer, and only then mutates. A resource that disappears between the
//! check and the write is reported as not found.

pub mod problems;
pub mod sheets;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::auth::ownership::Decision;
use crate::models::auth::SessionClaims;
use crate::store::StoreError;

/// Resource operation errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ResourceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(c) => ResourceError::Conflict(format!("Conflict on {c}")),
            StoreError::Unavailable(msg) => ResourceError::StoreUnavailable(msg),
            StoreError::Internal(msg) => ResourceError::Internal(msg),
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Turn an authorization decision into a result.
pub fn enforce(decision: Decision) -> ResourceResult<()> {
    match decision {
        Decision::Permitted => Ok(()),
        Decision::Unauthenticated => Err(ResourceError::Unauthenticated),
        Decision::Forbidden => Err(ResourceError::Forbidden("Forbidden".into())),
        Decision::Denied(reason) => Err(ResourceError::Forbidden(reason.to_string())),
    }
}

/// The acting identity's claims, or `Unauthenticated`.
pub(crate) fn actor(claims: Option<&SessionClaims>) -> ResourceResult<&SessionClaims> {
    claims.ok_or(ResourceError::Unauthenticated)
}
