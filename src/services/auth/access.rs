//! Access decision point.
//!
//! Pure role evaluation against the request's identity. Knows nothing about
//! HTTP; the route guard maps `DenyReason` to 401/403.

use crate::services::auth::identity::Identity;
use crate::services::auth::role::{Role, RoleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate `required` against the (optional) identity.
///
/// - empty `required`: allow
/// - no identity: `Unauthenticated`
/// - no shared role: `Forbidden`
pub fn decide(identity: Option<&Identity>, required: &RoleSet) -> Decision {
    if required.is_empty() {
        return Decision::Allow;
    }

    match identity {
        None => Decision::Deny(DenyReason::Unauthenticated),
        Some(identity) if identity.has_any_role(required) => Decision::Allow,
        Some(_) => Decision::Deny(DenyReason::Forbidden),
    }
}

/// Allow any authenticated identity, whatever its roles.
pub fn decide_authenticated(identity: Option<&Identity>) -> Decision {
    match identity {
        Some(_) => Decision::Allow,
        None => Decision::Deny(DenyReason::Unauthenticated),
    }
}

/// Requirement a guarded route declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    Authenticated,
    AnyOf(RoleSet),
}

impl RoleRequirement {
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::AnyOf(roles.into_iter().collect())
    }

    pub fn evaluate(&self, identity: Option<&Identity>) -> Decision {
        match self {
            RoleRequirement::Authenticated => decide_authenticated(identity),
            RoleRequirement::AnyOf(required) => decide(identity, required),
        }
    }
}
