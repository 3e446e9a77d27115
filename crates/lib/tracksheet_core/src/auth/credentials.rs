//! Email/password registration and verification.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::AuthError;
use super::password::{hash_password, verify_password};
use crate::models::auth::{Identity, NewIdentity, normalize_email};
use crate::store::{IdentityStore, StoreError};

/// Register a credential-backed identity.
///
/// Email uniqueness is left to the store: a concurrent registration for the
/// same address loses on the unique index and surfaces as
/// [`AuthError::DuplicateIdentity`].
pub async fn register<S>(
    store: &S,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<Identity, AuthError>
where
    S: IdentityStore + ?Sized,
{
    if email.trim().is_empty() || password.is_empty() || display_name.trim().is_empty() {
        return Err(AuthError::Validation("All fields are required".into()));
    }

    let hash = hash_password(password)?;
    let payload = NewIdentity::registration(email, hash, display_name.trim());
    match store.insert_identity(payload).await {
        Ok(identity) => {
            info!(identity_id = %identity.id, "registered identity");
            Ok(identity)
        }
        Err(StoreError::Conflict(constraint)) => {
            debug!(%constraint, "registration rejected: email already registered");
            Err(AuthError::DuplicateIdentity)
        }
        Err(e) => Err(e.into()),
    }
}

/// Verify an email/password pair and record the login.
///
/// Checks run in a fixed order: missing fields, lookup, local credential
/// presence, hash comparison, activity flag. `last_login` is only touched
/// when every check passes.
pub async fn verify<S>(
    store: &S,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Identity, AuthError>
where
    S: IdentityStore + ?Sized,
{
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Email and password are required".into(),
        ));
    }

    let email = normalize_email(email);
    let identity = store
        .find_identity_by_email(&email)
        .await?
        .ok_or(AuthError::NotFound)?;

    let Some(hash) = identity.password_hash.as_deref() else {
        debug!(identity_id = %identity.id, "credential login on federated account");
        return Err(AuthError::NoLocalCredential);
    };

    if !verify_password(password, hash)? {
        warn!(identity_id = %identity.id, "credential login failed: wrong password");
        return Err(AuthError::InvalidCredential);
    }

    if !identity.is_active {
        warn!(identity_id = %identity.id, "credential login on deactivated account");
        return Err(AuthError::InactiveAccount);
    }

    store
        .record_login(identity.id, now)
        .await?
        .ok_or(AuthError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{FederatedProfile, Role};
    use crate::store::in_memory::InMemoryStore;

    #[tokio::test]
    async fn register_persists_defaults() {
        let store = InMemoryStore::new();
        let identity = register(&store, " Ada@Example.com ", "pw123456", "Ada")
            .await
            .unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.role, Role::User);
        assert!(identity.is_active);
        assert_eq!(identity.reputation, 0);
        assert_eq!(identity.profile.name.as_deref(), Some("Ada"));
        assert_eq!(identity.profile.timezone.as_deref(), Some("UTC"));
        assert!(identity.has_local_credential());
        assert_ne!(identity.password_hash.as_deref(), Some("pw123456"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_create_one_identity() {
        let store = InMemoryStore::new();
        let attempts = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                register(&store, "race@x.com", "pw123456", &format!("R{i}")).await
            })
        });
        let results: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, AuthError::DuplicateIdentity))
        );
        assert_eq!(store.identity_count(), 1);
    }

    #[tokio::test]
    async fn second_registration_is_duplicate_case_insensitively() {
        let store = InMemoryStore::new();
        register(&store, "a@x.com", "pw123456", "A").await.unwrap();
        let err = register(&store, "A@X.COM", "other-pw", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let store = InMemoryStore::new();
        let err = register(&store, "a@x.com", "", "A").await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
        let err = register(&store, "a@x.com", "pw", "  ").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn verify_success_updates_last_login() {
        let store = InMemoryStore::new();
        let registered = register(&store, "a@x.com", "pw123456", "A").await.unwrap();
        assert!(registered.last_login.is_none());

        let now = Utc::now();
        let identity = verify(&store, "A@x.com", "pw123456", now).await.unwrap();
        assert_eq!(identity.id, registered.id);
        assert_eq!(identity.last_login, Some(now));
    }

    #[tokio::test]
    async fn wrong_password_does_not_touch_last_login() {
        let store = InMemoryStore::new();
        let registered = register(&store, "a@x.com", "pw123456", "A").await.unwrap();

        let err = verify(&store, "a@x.com", "nope", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
        assert_eq!(err.to_string(), "Invalid email or password");

        let stored = store
            .find_identity_by_id(registered.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_login.is_none());
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let store = InMemoryStore::new();
        let err = verify(&store, "ghost@x.com", "pw", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No user found with this email");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_lookup() {
        let store = InMemoryStore::new();
        let err = verify(&store, "", "pw", Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
    }

    #[tokio::test]
    async fn federated_account_has_no_local_credential() {
        let store = InMemoryStore::new();
        let profile = FederatedProfile {
            email: "fed@x.com".into(),
            name: None,
            avatar: None,
            email_verified: true,
        };
        store
            .insert_identity(NewIdentity::federated(&profile, Utc::now()))
            .await
            .unwrap();

        for attempt in ["", "anything", "pw123456"] {
            let err = verify(&store, "fed@x.com", attempt, Utc::now())
                .await
                .unwrap_err();
            if attempt.is_empty() {
                assert!(matches!(err, AuthError::Validation(_)));
            } else {
                assert!(matches!(err, AuthError::NoLocalCredential));
            }
        }
    }

    #[tokio::test]
    async fn inactive_account_is_rejected_with_correct_password() {
        let store = InMemoryStore::new();
        let identity = register(&store, "a@x.com", "pw123456", "A").await.unwrap();
        store
            .update_account(identity.id, None, Some(false))
            .await
            .unwrap();

        let err = verify(&store, "a@x.com", "pw123456", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InactiveAccount));
        assert_eq!(
            err.to_string(),
            "Account is deactivated. Please contact support"
        );
        let stored = store.find_identity_by_id(identity.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_none());
    }
}
