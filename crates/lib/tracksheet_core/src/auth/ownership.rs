//! Per-instance authorization for owned resources and catalog entities.

use uuid::Uuid;

use super::guard::{self, CapabilityRequirement, DenialReason, GuardOutcome};
use crate::models::auth::SessionClaims;
use crate::models::problem::Problem;
use crate::models::sheet::Sheet;
use crate::models::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
    Duplicate,
}

/// How access to a resource instance is governed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// A single owner; public resources are world-readable.
    Owned { owner_id: Uuid, is_public: bool },
    /// Shared entity; writes are gated by role.
    Catalog,
}

/// Anything the authorizer can decide on.
pub trait Governed {
    fn ownership(&self) -> Ownership;
}

impl Governed for Sheet {
    fn ownership(&self) -> Ownership {
        Ownership::Owned {
            owner_id: self.owner_id,
            is_public: self.is_public,
        }
    }
}

impl Governed for Template {
    fn ownership(&self) -> Ownership {
        match (self.is_official, self.owner_id) {
            (false, Some(owner_id)) => Ownership::Owned {
                owner_id,
                is_public: self.is_public,
            },
            _ => Ownership::Catalog,
        }
    }
}

impl Governed for Problem {
    fn ownership(&self) -> Ownership {
        Ownership::Catalog
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permitted,
    Unauthenticated,
    /// Not the owner of a resource that requires ownership.
    Forbidden,
    /// A capability requirement failed.
    Denied(DenialReason),
}

impl Decision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Decision::Permitted)
    }
}

impl From<GuardOutcome> for Decision {
    fn from(outcome: GuardOutcome) -> Self {
        match outcome {
            GuardOutcome::Permitted => Decision::Permitted,
            GuardOutcome::Unauthenticated => Decision::Unauthenticated,
            GuardOutcome::Denied(reason) => Decision::Denied(reason),
        }
    }
}

/// What kind of resource a caller wants to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateKind {
    Owned,
    Catalog,
}

/// Decide whether `claims` may perform `action` on `resource`.
pub fn authorize<R>(claims: Option<&SessionClaims>, resource: &R, action: Action) -> Decision
where
    R: Governed + ?Sized,
{
    match resource.ownership() {
        Ownership::Owned {
            owner_id,
            is_public,
        } => {
            let is_owner = claims.is_some_and(|c| c.actor_id() == owner_id);
            match action {
                // Private resources read as forbidden to everyone but the owner,
                // signed in or not.
                Action::Read if is_public || is_owner => Decision::Permitted,
                Action::Read => Decision::Forbidden,
                _ if claims.is_none() => Decision::Unauthenticated,
                Action::Write | Action::Delete if is_owner => Decision::Permitted,
                Action::Write | Action::Delete => Decision::Forbidden,
                Action::Duplicate if is_public || is_owner => Decision::Permitted,
                Action::Duplicate => Decision::Forbidden,
            }
        }
        Ownership::Catalog => match action {
            Action::Read => Decision::Permitted,
            Action::Duplicate => {
                guard::check(claims, &CapabilityRequirement::authenticated()).into()
            }
            Action::Write | Action::Delete => {
                guard::check(claims, &CapabilityRequirement::active_admin()).into()
            }
        },
    }
}

/// Decide whether `claims` may create a resource of `kind`. Owned resources
/// need a session; catalog entities need an active admin.
pub fn authorize_create(claims: Option<&SessionClaims>, kind: CreateKind) -> Decision {
    let requirement = match kind {
        CreateKind::Owned => CapabilityRequirement::authenticated(),
        CreateKind::Catalog => CapabilityRequirement::active_admin(),
    };
    guard::check(claims, &requirement).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Profile, Role, SessionUser};
    use crate::models::sheet::SheetDraft;
    use chrono::Utc;

    fn claims_for(id: Uuid, role: Role) -> SessionClaims {
        SessionClaims {
            user: SessionUser {
                id,
                email: "u@x.com".into(),
                username: None,
                role,
                is_active: true,
                reputation: 0,
                profile: Profile::default(),
                last_login: None,
                email_verified: None,
            },
            iat: 0,
            exp: 0,
        }
    }

    fn sheet(owner: Uuid, is_public: bool) -> Sheet {
        Sheet::create(
            owner,
            SheetDraft {
                name: "S".into(),
                is_public,
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn private_resource_is_owner_only() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let private = sheet(a, false);
        let owner = claims_for(a, Role::User);
        let other = claims_for(b, Role::User);

        assert_eq!(authorize(Some(&other), &private, Action::Read), Decision::Forbidden);
        assert_eq!(authorize(Some(&owner), &private, Action::Read), Decision::Permitted);
        assert_eq!(authorize(None, &private, Action::Read), Decision::Forbidden);
    }

    #[test]
    fn public_resource_is_readable_but_not_writable_by_others() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let public = sheet(a, true);
        let other = claims_for(b, Role::User);

        assert_eq!(authorize(Some(&other), &public, Action::Read), Decision::Permitted);
        assert_eq!(authorize(None, &public, Action::Read), Decision::Permitted);
        assert_eq!(authorize(Some(&other), &public, Action::Write), Decision::Forbidden);
        assert_eq!(authorize(Some(&other), &public, Action::Delete), Decision::Forbidden);
    }

    #[test]
    fn admins_do_not_bypass_ownership() {
        let private = sheet(Uuid::now_v7(), false);
        let admin = claims_for(Uuid::now_v7(), Role::Admin);
        assert_eq!(authorize(Some(&admin), &private, Action::Write), Decision::Forbidden);
    }

    #[test]
    fn mutations_without_session_are_unauthenticated() {
        let public = sheet(Uuid::now_v7(), true);
        for action in [Action::Write, Action::Delete, Action::Duplicate] {
            assert_eq!(authorize(None, &public, action), Decision::Unauthenticated);
        }
    }

    #[test]
    fn duplicate_requires_readable_source() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let other = claims_for(b, Role::User);
        assert_eq!(
            authorize(Some(&other), &sheet(a, true), Action::Duplicate),
            Decision::Permitted
        );
        assert_eq!(
            authorize(Some(&other), &sheet(a, false), Action::Duplicate),
            Decision::Forbidden
        );
        assert_eq!(
            authorize(Some(&claims_for(a, Role::User)), &sheet(a, false), Action::Duplicate),
            Decision::Permitted
        );
    }

    #[test]
    fn catalog_writes_need_active_admin() {
        let official = Template::create(
            crate::models::template::TemplateDraft {
                name: "T".into(),
                description: None,
                author: "A".into(),
                category: "C".into(),
                difficulty: Default::default(),
                problems: vec![],
                is_official: true,
                is_public: true,
            },
            None,
            Utc::now(),
        );
        let user = claims_for(Uuid::now_v7(), Role::User);
        let mut admin = claims_for(Uuid::now_v7(), Role::Admin);

        assert_eq!(authorize(None, &official, Action::Read), Decision::Permitted);
        assert_eq!(authorize(None, &official, Action::Write), Decision::Unauthenticated);
        assert!(matches!(
            authorize(Some(&user), &official, Action::Delete),
            Decision::Denied(DenialReason::RoleNotAllowed { .. })
        ));
        assert_eq!(authorize(Some(&admin), &official, Action::Write), Decision::Permitted);

        admin.user.is_active = false;
        assert_eq!(
            authorize(Some(&admin), &official, Action::Write),
            Decision::Denied(DenialReason::Inactive)
        );
    }

    #[test]
    fn create_rules() {
        let user = claims_for(Uuid::now_v7(), Role::User);
        assert_eq!(authorize_create(None, CreateKind::Owned), Decision::Unauthenticated);
        assert!(authorize_create(Some(&user), CreateKind::Owned).is_permitted());
        assert!(!authorize_create(Some(&user), CreateKind::Catalog).is_permitted());
        let admin = claims_for(Uuid::now_v7(), Role::Admin);
        assert!(authorize_create(Some(&admin), CreateKind::Catalog).is_permitted());
    }
}
