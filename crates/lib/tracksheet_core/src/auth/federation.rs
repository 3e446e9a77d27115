//! Identity federation: exchange a provider assertion for a local identity.
//!
//! Provider-side OAuth is handled upstream by a broker that signs a short-lived
//! assertion per login. [`SignedAssertionVerifier`] checks those assertions;
//! [`resolve_or_create`] maps the vouched profile to exactly one identity.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::AuthError;
use crate::models::auth::{FederatedProfile, Identity, NewIdentity, Provider};
use crate::store::{IdentityStore, Upserted};

/// Turns a provider assertion into the profile it vouches for.
#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    async fn verify(&self, provider: Provider, assertion: &str)
    -> Result<FederatedProfile, AuthError>;
}

#[derive(Debug, Deserialize)]
struct AssertionClaims {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "picture")]
    avatar: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

/// Verifies HS256 assertions signed with a per-provider shared secret.
#[derive(Default)]
pub struct SignedAssertionVerifier {
    keys: HashMap<Provider, DecodingKey>,
}

impl SignedAssertionVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept assertions for `provider` signed with `secret`.
    pub fn with_provider(mut self, provider: Provider, secret: &[u8]) -> Self {
        self.keys.insert(provider, DecodingKey::from_secret(secret));
        self
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.keys.contains_key(&provider)
    }
}

#[async_trait]
impl AssertionVerifier for SignedAssertionVerifier {
    async fn verify(
        &self,
        provider: Provider,
        assertion: &str,
    ) -> Result<FederatedProfile, AuthError> {
        let key = self.keys.get(&provider).ok_or_else(|| {
            AuthError::Validation(format!("Sign-in with {provider} is not configured"))
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<AssertionClaims>(assertion, key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidKeyFormat | ErrorKind::Crypto(_) => {
                    AuthError::Internal(format!("assertion key error: {e}"))
                }
                _ => {
                    debug!(%provider, error = %e, "rejected federation assertion");
                    AuthError::Unauthenticated(format!("invalid {provider} assertion"))
                }
            }
        })?;

        let claims = data.claims;
        if claims.email.trim().is_empty() {
            return Err(AuthError::Validation(
                "Provider did not supply an email address".into(),
            ));
        }
        Ok(FederatedProfile {
            email: claims.email,
            name: claims.name,
            avatar: claims.avatar,
            email_verified: claims.email_verified,
        })
    }
}

/// Find the identity for a federated profile, creating it on first sign-in.
///
/// Creation is a single insert-if-absent keyed by email, so concurrent first
/// logins for one address yield exactly one record. Existing records are
/// returned as stored.
pub async fn resolve_or_create<S>(
    store: &S,
    profile: &FederatedProfile,
    now: DateTime<Utc>,
) -> Result<Upserted, AuthError>
where
    S: IdentityStore + ?Sized,
{
    if profile.email.trim().is_empty() {
        return Err(AuthError::Validation(
            "Provider did not supply an email address".into(),
        ));
    }
    let outcome = store
        .insert_identity_if_absent(NewIdentity::federated(profile, now))
        .await?;
    if let Upserted::Created(identity) = &outcome {
        info!(identity_id = %identity.id, "created identity from federated sign-in");
    }
    Ok(outcome)
}

/// Full federated login: verify the assertion, resolve the identity, reject
/// deactivated accounts and record the login.
pub async fn login<S>(
    store: &S,
    verifier: &dyn AssertionVerifier,
    provider: Provider,
    assertion: &str,
    now: DateTime<Utc>,
) -> Result<Identity, AuthError>
where
    S: IdentityStore + ?Sized,
{
    if assertion.trim().is_empty() {
        return Err(AuthError::Validation(
            "Provider and assertion are required".into(),
        ));
    }
    let profile = verifier.verify(provider, assertion).await?;
    let identity = match resolve_or_create(store, &profile, now).await? {
        Upserted::Created(identity) => return Ok(identity),
        Upserted::Existing(identity) => identity,
    };

    if !identity.is_active {
        warn!(identity_id = %identity.id, %provider, "federated login on deactivated account");
        return Err(AuthError::InactiveAccount);
    }
    store
        .record_login(identity.id, now)
        .await?
        .ok_or(AuthError::NotFound)
}
