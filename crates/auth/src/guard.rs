//! Permissions guard driven by declarative route metadata.
//!
//! Routes carry data (`RouteMetadata`), not control flow; the guard is a
//! single function over that data and the caller's role.

use serde::Serialize;

use crate::{AccessControl, Action, ActionSet, AuthzError, Permission, Resource, Role};

/// Whether a route needs an active organization.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationScope {
    #[default]
    Required,
    /// Authenticated, but no organization is resolved (e.g. creating an
    /// organization, accepting an invitation).
    Exempt,
}

/// Permission metadata attached to a route declaration.
///
/// `RouteMetadata::default()` declares nothing, which [`validate`] rejects.
///
/// [`validate`]: RouteMetadata::validate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteMetadata {
    pub resource: Option<Resource>,
    pub actions: ActionSet,
    pub scope: OrganizationScope,
}

impl RouteMetadata {
    /// Organization-scoped route requiring every action in `actions` on
    /// `resource`.
    pub fn guarded(resource: Resource, actions: &[Action]) -> Self {
        Self {
            resource: Some(resource),
            actions: actions.iter().copied().collect(),
            scope: OrganizationScope::Required,
        }
    }

    /// Authenticated route that bypasses organization scoping.
    pub fn exempt() -> Self {
        Self {
            resource: None,
            actions: ActionSet::empty(),
            scope: OrganizationScope::Exempt,
        }
    }

    pub fn is_exempt(&self) -> bool {
        self.scope == OrganizationScope::Exempt
    }

    /// Permissions this route requires (empty for exempt routes).
    pub fn required(&self) -> Vec<Permission> {
        match self.resource {
            Some(resource) => self.actions.iter().map(|a| Permission::new(resource, a)).collect(),
            None => Vec::new(),
        }
    }

    /// Startup check for a route declaration.
    pub fn validate(&self, route: &str) -> Result<(), AuthzError> {
        let reason = match (self.scope, self.resource, self.actions.is_empty()) {
            (OrganizationScope::Required, None, _) => Some("no resource declared"),
            (OrganizationScope::Required, Some(_), true) => Some("no required actions declared"),
            (OrganizationScope::Exempt, Some(_), _) | (OrganizationScope::Exempt, None, false) => {
                Some("exempt routes cannot require permissions")
            }
            _ => None,
        };

        match reason {
            Some(reason) => Err(AuthzError::RouteMetadata {
                route: route.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Terminal states of the per-request guard (`Unchecked` is the call itself).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized,
    /// The first required permission the role lacks.
    Denied(Permission),
    /// The route carries no usable metadata; a declaration defect.
    ConfigError,
}

impl GuardDecision {
    pub fn into_result(self, route: &str) -> Result<(), AuthzError> {
        match self {
            GuardDecision::Authorized => Ok(()),
            GuardDecision::Denied(permission) => Err(AuthzError::Forbidden(permission)),
            GuardDecision::ConfigError => Err(AuthzError::RouteMetadata {
                route: route.to_string(),
                reason: "no permission metadata at request time",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionGuard<'a> {
    access: &'a AccessControl,
}

impl<'a> PermissionGuard<'a> {
    pub fn new(access: &'a AccessControl) -> Self {
        Self { access }
    }

    /// Authorized iff the role holds every declared action.
    pub fn check(&self, metadata: &RouteMetadata, role: Role) -> GuardDecision {
        let required = metadata.required();
        if required.is_empty() {
            return GuardDecision::ConfigError;
        }

        match required.into_iter().find(|p| !self.access.allows(role, *p)) {
            Some(missing) => GuardDecision::Denied(missing),
            None => GuardDecision::Authorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access() -> AccessControl {
        AccessControl::standard().unwrap()
    }

    #[test]
    fn member_cannot_delete_workout() {
        let ac = access();
        let route = RouteMetadata::guarded(Resource::Workout, &[Action::Delete]);
        assert_eq!(
            PermissionGuard::new(&ac).check(&route, Role::Member),
            GuardDecision::Denied(Permission::new(Resource::Workout, Action::Delete))
        );
    }

    #[test]
    fn owner_can_delete_athlete() {
        let ac = access();
        let route = RouteMetadata::guarded(Resource::Athlete, &[Action::Delete]);
        assert_eq!(
            PermissionGuard::new(&ac).check(&route, Role::Owner),
            GuardDecision::Authorized
        );
    }

    #[test]
    fn every_declared_action_must_be_held() {
        let ac = access();
        let route = RouteMetadata::guarded(Resource::PersonalRecord, &[Action::Create, Action::Update]);
        let guard = PermissionGuard::new(&ac);

        assert_eq!(
            guard.check(&route, Role::Member),
            GuardDecision::Denied(Permission::new(Resource::PersonalRecord, Action::Update))
        );
        assert_eq!(guard.check(&route, Role::Admin), GuardDecision::Authorized);
    }

    #[test]
    fn undeclared_metadata_is_a_config_error() {
        let ac = access();
        let guard = PermissionGuard::new(&ac);
        for role in Role::ALL {
            assert_eq!(guard.check(&RouteMetadata::default(), role), GuardDecision::ConfigError);
        }
        assert!(matches!(
            GuardDecision::ConfigError.into_result("GET /x"),
            Err(AuthzError::RouteMetadata { .. })
        ));
    }

    #[test]
    fn validate_rejects_incomplete_declarations() {
        assert!(RouteMetadata::default().validate("GET /workouts").is_err());
        assert!(RouteMetadata::guarded(Resource::Workout, &[]).validate("GET /workouts").is_err());

        let exempt_with_permission = RouteMetadata {
            scope: OrganizationScope::Exempt,
            ..RouteMetadata::guarded(Resource::Workout, &[Action::Read])
        };
        assert!(exempt_with_permission.validate("GET /workouts").is_err());

        assert!(RouteMetadata::exempt().validate("POST /organizations").is_ok());
        assert!(
            RouteMetadata::guarded(Resource::Workout, &[Action::Read])
                .validate("GET /workouts")
                .is_ok()
        );
    }

    #[test]
    fn denial_message_does_not_name_the_resource() {
        let err = GuardDecision::Denied(Permission::new(Resource::Athlete, Action::Delete))
            .into_result("DELETE /athletes/:id")
            .unwrap_err();
        assert!(!err.to_string().contains("athlete"));
    }
}
