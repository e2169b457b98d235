use serde::Serialize;
use thiserror::Error;

use crate::{AccessControl, Permission, Role};

/// Every way the access layer can turn a request away.
///
/// Display strings are static and never name the resource, so a denial
/// does not reveal what exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No resolvable session.
    #[error("authentication required")]
    Unauthenticated,

    /// Valid session, but no single organization could be selected.
    #[error("an active organization is required for this request")]
    MissingOrganization,

    /// The caller's role lacks a required action.
    #[error("you do not have permission to perform this action")]
    Forbidden(Permission),

    /// The route's permission metadata is absent or contradictory.
    #[error("route '{route}' has invalid permission metadata: {reason}")]
    RouteMetadata { route: String, reason: &'static str },
}

/// Detailed explanation of an authorization decision, for the role-audit
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub role: Role,
    pub reason: String,
    /// Roles that would allow the permission, lowest first.
    pub granting_roles: Vec<Role>,
}

/// Explain why `role` is or is not allowed `required`.
pub fn explain_authorization(
    access: &AccessControl,
    role: Role,
    required: Permission,
) -> AuthorizationExplanation {
    let granted = access.allows(role, required);
    let granting_roles = access.roles_granting(required);

    let reason = if granted {
        format!("role '{role}' grants '{required}'")
    } else if granting_roles.is_empty() {
        format!("no role grants '{required}'")
    } else {
        let names: Vec<&str> = granting_roles.iter().map(|r| r.as_str()).collect();
        format!(
            "role '{role}' does not grant '{required}'; required role: {}",
            names.join(" or ")
        )
    };

    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted,
        role,
        reason,
        granting_roles,
    }
}
