//! Application error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use tracksheet_core::auth::AuthError;
use tracksheet_core::services::ResourceError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Service temporarily unavailable",
            ),
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::NotFound | AuthError::NoLocalCredential | AuthError::InvalidCredential => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::InactiveAccount => AppError::Forbidden(e.to_string()),
            AuthError::DuplicateIdentity => AppError::Conflict(e.to_string()),
            AuthError::Unauthenticated(msg) => AppError::Unauthorized(msg),
            AuthError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ResourceError> for AppError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::Validation(msg) => AppError::Validation(msg),
            ResourceError::Unauthenticated => AppError::Unauthorized(e.to_string()),
            ResourceError::Forbidden(msg) => AppError::Forbidden(msg),
            ResourceError::NotFound(msg) => AppError::NotFound(msg),
            ResourceError::Conflict(msg) => AppError::Conflict(msg),
            ResourceError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            ResourceError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracksheet_core::store::StoreError;

    #[test]
    fn identity_failures_map_to_statuses() {
        let cases = [
            (AuthError::NotFound, StatusCode::UNAUTHORIZED),
            (AuthError::NoLocalCredential, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (AuthError::InactiveAccount, StatusCode::FORBIDDEN),
            (AuthError::DuplicateIdentity, StatusCode::CONFLICT),
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn resource_failures_map_to_statuses() {
        assert_eq!(
            AppError::from(ResourceError::Unauthenticated).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(ResourceError::Conflict("x".into())).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(ResourceError::Internal("boom".into())).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ResourceError::from(StoreError::Unavailable("pool".into())))
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
