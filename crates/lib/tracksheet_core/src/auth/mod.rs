//! Authentication and authorization.
//!
//! Credential verification, identity federation, session minting, the
//! capability guard and the ownership authorizer. Shared by `tracksheet_api`
//! and the resource services.

pub mod credentials;
pub mod federation;
pub mod guard;
pub mod jwt;
pub mod ownership;
pub mod password;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
///
/// Identity variants carry the exact user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("No user found with this email")]
    NotFound,

    #[error("Please sign in with your social account")]
    NoLocalCredential,

    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Account is deactivated. Please contact support")]
    InactiveAccount,

    #[error("User already exists")]
    DuplicateIdentity,

    /// Session token or federation assertion rejected.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            StoreError::Conflict(c) => AuthError::Internal(format!("unexpected conflict on {c}")),
            StoreError::Internal(msg) => AuthError::Internal(msg),
        }
    }
}
