//! Capability guard.
//!
//! Evaluates a [`CapabilityRequirement`] against the caller's claims. The
//! outcome is a value; turning a non-permit into an error is the caller's job.

use std::fmt;

use crate::models::auth::{Role, SessionClaims};

/// What a caller must hold to proceed. The default requires only a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRequirement {
    pub required_role: Option<Role>,
    pub required_roles: Vec<Role>,
    pub require_active: bool,
    pub min_reputation: i64,
}

impl CapabilityRequirement {
    /// Any session, active or not.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// An active session.
    pub fn active() -> Self {
        Self {
            require_active: true,
            ..Self::default()
        }
    }

    /// An active admin. Gate for catalog writes and account management.
    pub fn active_admin() -> Self {
        Self {
            required_roles: vec![Role::Admin],
            require_active: true,
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn with_min_reputation(mut self, min: i64) -> Self {
        self.min_reputation = min;
        self
    }
}

/// Why a present session failed a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    Inactive,
    InsufficientReputation { required: i64, actual: i64 },
    RoleMismatch { required: Role, actual: Role },
    RoleNotAllowed { allowed: Vec<Role>, actual: Role },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Inactive => f.write_str("Account is deactivated"),
            DenialReason::InsufficientReputation { required, actual } => {
                write!(f, "Requires reputation {required} (have {actual})")
            }
            DenialReason::RoleMismatch { required, .. } => write!(f, "Requires {required} role"),
            DenialReason::RoleNotAllowed { allowed, .. } => {
                let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
                write!(f, "Requires one of: {}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Unauthenticated,
    Denied(DenialReason),
    Permitted,
}

impl GuardOutcome {
    pub fn is_permitted(&self) -> bool {
        matches!(self, GuardOutcome::Permitted)
    }
}

/// Check `claims` against `requirement`.
///
/// Short-circuits in order: session present, active flag, reputation,
/// single required role, allowed role set.
pub fn check(claims: Option<&SessionClaims>, requirement: &CapabilityRequirement) -> GuardOutcome {
    let Some(claims) = claims else {
        return GuardOutcome::Unauthenticated;
    };
    let user = &claims.user;

    if requirement.require_active && !user.is_active {
        return GuardOutcome::Denied(DenialReason::Inactive);
    }
    if user.reputation < requirement.min_reputation {
        return GuardOutcome::Denied(DenialReason::InsufficientReputation {
            required: requirement.min_reputation,
            actual: user.reputation,
        });
    }
    if let Some(required) = requirement.required_role
        && user.role != required
    {
        return GuardOutcome::Denied(DenialReason::RoleMismatch {
            required,
            actual: user.role,
        });
    }
    if !requirement.required_roles.is_empty() && !requirement.required_roles.contains(&user.role) {
        return GuardOutcome::Denied(DenialReason::RoleNotAllowed {
            allowed: requirement.required_roles.clone(),
            actual: user.role,
        });
    }
    GuardOutcome::Permitted
}
