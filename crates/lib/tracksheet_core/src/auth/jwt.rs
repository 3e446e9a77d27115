//! Session token minting and verification (HS256 JWT).

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{error, info};

use super::AuthError;
use crate::models::auth::{Identity, SessionClaims, SessionUser};

/// Default session lifetime: 30 days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// A freshly minted session.
#[derive(Debug, Clone)]
pub struct MintedSession {
    pub token: String,
    pub claims: SessionClaims,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies signed session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot `identity` into signed claims expiring `ttl` after `now`.
    pub fn mint(&self, identity: &Identity, now: DateTime<Utc>) -> Result<MintedSession, AuthError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            user: SessionUser::from(identity),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;
        Ok(MintedSession {
            token,
            claims,
            expires_at,
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Bad signatures, malformed and expired tokens are
    /// [`AuthError::Unauthenticated`]; key-level failures are internal.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::Unauthenticated(format!("session token: {e}")),
                _ => {
                    error!(error = %e, "session token verification failed unexpectedly");
                    AuthError::Internal(format!("session token: {e}"))
                }
            })
    }

    /// Carry an existing session forward unchanged. No store read happens, so
    /// the snapshot stays as stale as it was.
    pub fn refresh(&self, claims: SessionClaims) -> SessionClaims {
        claims
    }
}

/// Public session projection: exactly the snapshotted identity fields.
pub fn to_public_session(claims: &SessionClaims) -> SessionUser {
    claims.user.clone()
}

/// Resolve the signing secret: `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    for var in ["JWT_SECRET", "AUTH_SECRET"] {
        if let Ok(secret) = std::env::var(var)
            && !secret.is_empty()
        {
            return secret;
        }
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new session signing secret");
    secret
}

fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tracksheet")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Profile, Role, SocialSettings};
    use uuid::Uuid;

    fn identity() -> Identity {
        let now = Utc::now();
        Identity {
            id: Uuid::now_v7(),
            email: "a@x.com".into(),
            email_verified: Some(now),
            username: Some("ada".into()),
            password_hash: Some("$2b$10$secret".into()),
            role: Role::Moderator,
            is_active: true,
            reputation: 42,
            profile: Profile::seeded(Some("Ada"), Some("https://img/a.png")),
            social_settings: SocialSettings::default(),
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(b"test-secret", Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    #[test]
    fn mint_then_public_session_round_trips_every_field() {
        let identity = identity();
        let now = Utc::now();
        let minted = issuer().mint(&identity, now).unwrap();
        let public = to_public_session(&issuer().verify(&minted.token).unwrap());

        assert_eq!(public.id, identity.id);
        assert_eq!(public.email, identity.email);
        assert_eq!(public.username, identity.username);
        assert_eq!(public.role, identity.role);
        assert_eq!(public.is_active, identity.is_active);
        assert_eq!(public.reputation, identity.reputation);
        assert_eq!(public.profile, identity.profile);
        assert_eq!(
            public.last_login.map(|t| t.timestamp_micros()),
            identity.last_login.map(|t| t.timestamp_micros())
        );
        assert_eq!(
            public.email_verified.map(|t| t.timestamp_micros()),
            identity.email_verified.map(|t| t.timestamp_micros())
        );
    }

    #[test]
    fn public_session_has_exactly_the_claim_fields() {
        let minted = issuer().mint(&identity(), Utc::now()).unwrap();
        let json = serde_json::to_value(to_public_session(&minted.claims)).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "email",
                "emailVerified",
                "id",
                "isActive",
                "lastLogin",
                "profile",
                "reputation",
                "role",
                "username"
            ]
        );
        let prefs = &json["profile"]["preferences"];
        assert_eq!(prefs["defaultView"], "grid");
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn expiry_is_thirty_days_after_mint() {
        let now = Utc::now();
        let minted = issuer().mint(&identity(), now).unwrap();
        assert_eq!(minted.claims.exp - minted.claims.iat, 30 * 24 * 60 * 60);
        assert_eq!(minted.expires_at, now + Duration::days(30));
    }

    #[test]
    fn claims_stay_stale_after_profile_change() {
        let mut identity = identity();
        let minted = issuer().mint(&identity, Utc::now()).unwrap();

        identity.profile.name = Some("Renamed".into());
        let refreshed = issuer().refresh(minted.claims.clone());
        assert_eq!(to_public_session(&refreshed).profile.name.as_deref(), Some("Ada"));
        assert_eq!(
            to_public_session(&minted.claims).profile.name.as_deref(),
            Some("Ada")
        );

        let reminted = issuer().mint(&identity, Utc::now()).unwrap();
        assert_eq!(
            to_public_session(&reminted.claims).profile.name.as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn tampered_wrong_key_and_expired_tokens_are_unauthenticated() {
        let minted = issuer().mint(&identity(), Utc::now()).unwrap();

        let mut tampered = minted.token.clone();
        tampered.push('x');
        assert!(matches!(
            issuer().verify(&tampered),
            Err(AuthError::Unauthenticated(_))
        ));

        let other = SessionIssuer::new(b"other-secret", Duration::days(30));
        assert!(matches!(
            other.verify(&minted.token),
            Err(AuthError::Unauthenticated(_))
        ));

        let stale = issuer()
            .mint(&identity(), Utc::now() - Duration::days(31))
            .unwrap();
        assert!(matches!(
            issuer().verify(&stale.token),
            Err(AuthError::Unauthenticated(_))
        ));

        assert!(matches!(
            issuer().verify("garbage"),
            Err(AuthError::Unauthenticated(_))
        ));
    }
}
