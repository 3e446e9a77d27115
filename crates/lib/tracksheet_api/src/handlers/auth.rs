//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{debug, info};
use tracksheet_core::auth::guard::CapabilityRequirement;
use tracksheet_core::auth::jwt::to_public_session;
use tracksheet_core::auth::{AuthError, credentials, federation};
use tracksheet_core::models::auth::{Identity, Provider};

use super::require;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::session::Session;
use crate::models::{
    CredentialsLoginRequest, FederatedLoginRequest, IdentityView, MessageResponse,
    ProfileUpdateRequest, RegisterRequest, RegisterResponse, SessionResponse, SessionView,
};
use crate::services::cookies::{clear_session_cookie, session_cookie};

/// Mint a session for `identity` and attach it as a cookie.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    identity: &Identity,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let minted = state.issuer.mint(identity, Utc::now())?;
    let cookie = session_cookie(
        &minted.token,
        state.issuer.ttl().num_seconds(),
        state.config.secure_cookies,
    );
    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            session: to_public_session(&minted.claims),
            token: minted.token,
            expires_at: minted.expires_at,
        }),
    ))
}

/// `POST /auth/register`: create a credential-backed identity.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let identity =
        credentials::register(state.store.as_ref(), &body.email, &body.password, &body.name)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".into(),
            identity_id: identity.id,
        }),
    ))
}

/// `POST /auth/login/credentials`: sign in with email + password.
pub async fn credentials_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsLoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let identity =
        credentials::verify(state.store.as_ref(), &body.email, &body.password, Utc::now()).await?;
    start_session(&state, jar, &identity)
}

/// `POST /auth/login/federated`: exchange a provider assertion for a session.
pub async fn federated_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<FederatedLoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    if body.provider.trim().is_empty() {
        return Err(AppError::Validation(
            "Provider and assertion are required".into(),
        ));
    }
    let provider: Provider = body.provider.trim().parse().map_err(AppError::Validation)?;
    let identity = federation::login(
        state.store.as_ref(),
        state.verifier.as_ref(),
        provider,
        &body.assertion,
        Utc::now(),
    )
    .await?;
    start_session(&state, jar, &identity)
}

/// `GET /auth/session`: the caller's public session.
pub async fn session_handler(session: Session) -> AppResult<Json<SessionView>> {
    let claims = require(session.claims(), &CapabilityRequirement::authenticated())?;
    Ok(Json(SessionView {
        session: to_public_session(claims),
    }))
}

/// `POST /auth/session/refresh`: re-mint the session from the stored identity.
pub async fn refresh_handler(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let claims = require(session.claims(), &CapabilityRequirement::authenticated())?;
    let identity = state
        .store
        .find_identity_by_id(claims.actor_id())
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| AppError::Unauthorized("Session no longer valid".into()))?;
    if !identity.is_active {
        return Err(AuthError::InactiveAccount.into());
    }
    debug!(identity_id = %identity.id, "refreshing session snapshot");
    start_session(&state, jar, &identity)
}

/// `POST /auth/logout`: clear the session cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(clear_session_cookie(state.config.secure_cookies)),
        Json(MessageResponse::new("Signed out")),
    )
}

/// `PUT /auth/profile`: edit the caller's profile. The current session keeps
/// its old snapshot until refreshed.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ProfileUpdateRequest>,
) -> AppResult<Json<IdentityView>> {
    let claims = require(session.claims(), &CapabilityRequirement::active())?;
    let store = state.store.as_ref();
    let current = store
        .find_identity_by_id(claims.actor_id())
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let profile = body.merge_into(current.profile);
    let updated = store
        .update_profile(current.id, profile)
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    info!(identity_id = %updated.id, "updated profile");
    Ok(Json(updated.into()))
}
