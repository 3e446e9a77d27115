//! Identity and session domain models.
//!
//! These are internal domain models, distinct from the HTTP request/response
//! types in `tracksheet_api` (which own their own camelCase wire shapes).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role carried by every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// UI preferences stored with the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub default_view: String,
    pub notifications: bool,
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_view: "grid".to_string(),
            notifications: true,
            theme: "system".to_string(),
        }
    }
}

/// Public-facing profile of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub timezone: Option<String>,
    pub preferences: Preferences,
}

impl Profile {
    /// Profile seeded with a display name and avatar, UTC timezone and default preferences.
    pub fn seeded(name: Option<&str>, avatar: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            avatar: avatar.map(str::to_string),
            timezone: Some("UTC".to_string()),
            preferences: Preferences::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Private,
}

/// Social visibility settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialSettings {
    pub profile_visibility: ProfileVisibility,
    pub allow_messages: bool,
}

impl Default for SocialSettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Public,
            allow_messages: true,
        }
    }
}

/// A persisted user account, credential- or federation-backed.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub username: Option<String>,
    /// bcrypt hash; `None` for accounts created through federation.
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub reputation: i64,
    pub profile: Profile,
    pub social_settings: SocialSettings,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn has_local_credential(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Insert payload for a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub reputation: i64,
    pub profile: Profile,
    pub social_settings: SocialSettings,
    pub last_login: Option<DateTime<Utc>>,
}

impl NewIdentity {
    /// Payload for an email/password registration.
    pub fn registration(email: &str, password_hash: String, display_name: &str) -> Self {
        Self {
            email: normalize_email(email),
            email_verified: None,
            username: None,
            password_hash: Some(password_hash),
            role: Role::User,
            is_active: true,
            reputation: 0,
            profile: Profile::seeded(Some(display_name), None),
            social_settings: SocialSettings::default(),
            last_login: None,
        }
    }

    /// Payload for a first federated sign-in. No local credential is stored.
    pub fn federated(profile: &FederatedProfile, now: DateTime<Utc>) -> Self {
        Self {
            email: normalize_email(&profile.email),
            email_verified: profile.email_verified.then_some(now),
            username: None,
            password_hash: None,
            role: Role::User,
            is_active: true,
            reputation: 0,
            profile: Profile::seeded(profile.name.as_deref(), profile.avatar.as_deref()),
            social_settings: SocialSettings::default(),
            last_login: Some(now),
        }
    }
}

/// Canonical form of an email address used as the identity key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Third-party identity providers accepted by the federation adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Identity attributes vouched for by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

/// Identity fields snapshotted into a session.
///
/// This is also the public session shape: nothing is withheld or added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub reputation: i64,
    pub profile: Profile,
    pub last_login: Option<DateTime<Utc>>,
    pub email_verified: Option<DateTime<Utc>>,
}

impl From<&Identity> for SessionUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            username: identity.username.clone(),
            role: identity.role,
            is_active: identity.is_active,
            reputation: identity.reputation,
            profile: identity.profile.clone(),
            last_login: identity.last_login,
            email_verified: identity.email_verified,
        }
    }
}

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub user: SessionUser,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

impl SessionClaims {
    pub fn actor_id(&self) -> Uuid {
        self.user.id
    }
}
