//! Session loading middleware.
//!
//! Every request passes through [`load_session`], which looks for a session
//! token in the `tracksheet_session` cookie, then in `Authorization: Bearer`.
//! A missing or unverifiable token leaves the request anonymous; rejecting it
//! is left to the guard or the ownership authorizer downstream.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, trace, warn};
use tracksheet_core::auth::AuthError;
use tracksheet_core::models::auth::SessionClaims;

use crate::AppState;
use crate::services::cookies::SESSION_COOKIE;

/// Claims of the caller, if any. Inserted into request extensions.
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<SessionClaims>);

impl Session {
    pub fn claims(&self) -> Option<&SessionClaims> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}

/// Token from the session cookie, else from a Bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && !cookie.value().is_empty()
    {
        trace!("session token found in cookie");
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            trace!("session token found in authorization header");
            t.to_string()
        })
}

/// Axum middleware: verifies the session token, if present, and injects
/// [`Session`] into request extensions.
pub async fn load_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let claims = match extract_token(request.headers()) {
        None => None,
        Some(token) => match state.issuer.verify(&token) {
            Ok(claims) => {
                debug!(identity_id = %claims.actor_id(), "session verified");
                Some(claims)
            }
            Err(AuthError::Unauthenticated(reason)) => {
                debug!(%reason, "ignoring invalid session token");
                None
            }
            Err(e) => {
                warn!(error = %e, "session verification failed");
                None
            }
        },
    };
    request.extensions_mut().insert(Session(claims));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("tracksheet_session=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_is_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
