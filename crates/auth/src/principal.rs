use serde::{Deserialize, Serialize};

use coachboard_core::{OrganizationId, UserId};

use crate::Role;

/// A user's membership in one organization.
///
/// The binding is owned by the identity/organization provider; this crate
/// only consumes the resolved role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub organization_id: OrganizationId,
    pub role: Role,
}

/// A fully resolved principal for authorization decisions: who is acting,
/// in which organization, and with which role there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, membership: Membership) -> Self {
        Self {
            user_id,
            organization_id: membership.organization_id,
            role: membership.role,
        }
    }
}
