//! Access control evaluator.

use crate::permissions::{Action, Permission, Resource};
use crate::roles::{Role, RoleDefinitions};
use crate::statements::{RegistryError, StatementRegistry, StatementSet};

/// Role definitions resolved against the statement registry, built once at startup.
///
/// Share it behind an `Arc`; it never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    roles: RoleDefinitions,
}

impl AccessControl {
    /// The standard statement registry and role grants.
    ///
    /// Fails fast on any unknown resource/action name.
    pub fn standard() -> Result<Self, RegistryError> {
        let registry = StatementRegistry::standard()?;
        let roles = RoleDefinitions::standard(&registry)?;
        tracing::debug!(
            owner_resources = roles.statements(Role::Owner).iter().count(),
            "access control configured"
        );
        Ok(Self { roles })
    }

    /// `true` iff `action` is in `role`'s statement for `resource`.
    pub fn can(&self, role: Role, resource: Resource, action: Action) -> bool {
        self.roles.statements(role).allows(resource, action)
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.can(role, permission.resource, permission.action)
    }

    pub fn statements(&self, role: Role) -> &StatementSet {
        self.roles.statements(role)
    }

    /// Flattened permission list of a role, in registry order.
    pub fn permissions(&self, role: Role) -> Vec<Permission> {
        self.statements(role)
            .iter()
            .flat_map(|(resource, actions)| {
                actions
                    .iter()
                    .map(move |action| Permission::new(resource, action))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Roles whose statements allow `permission`, lowest first.
    pub fn roles_granting(&self, permission: Permission) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.allows(*role, permission))
            .collect()
    }
}
