use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permissions::UnknownName;
use crate::statements::{RegistryError, StatementDeclaration, StatementRegistry, StatementSet};

/// Role of a user within one organization.
///
/// Variants are ordered by privilege: `Member < Admin < Owner`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Member, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Member => "Reads the organization's training data and logs personal records",
            Role::Admin => "Manages training data, members and invitations",
            Role::Owner => "Full control of the organization, including athlete removal",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Grants of the `member` role.
pub const MEMBER_GRANTS: &[StatementDeclaration<'static>] = &[
    ("workout", &["read"]),
    ("exercise", &["read"]),
    ("athlete", &["read"]),
    ("session", &["read"]),
    ("personalRecord", &["read", "create"]),
    ("complex", &["read"]),
    ("organization", &["read"]),
    ("member", &["read"]),
];

/// Grants `admin` adds on top of `member`.
pub const ADMIN_GRANTS: &[StatementDeclaration<'static>] = &[
    ("workout", &["create", "update", "delete"]),
    ("exercise", &["create", "update", "delete"]),
    ("athlete", &["create", "update"]),
    ("session", &["create", "update", "delete"]),
    ("personalRecord", &["update", "delete"]),
    ("complex", &["create", "update", "delete"]),
    ("organization", &["update"]),
    ("member", &["create", "update", "delete"]),
    ("invitation", &["read", "create", "delete"]),
];

/// Grants `owner` adds on top of `admin`.
pub const OWNER_GRANTS: &[StatementDeclaration<'static>] =
    &[("athlete", &["delete"]), ("organization", &["delete"])];

/// Fully enumerated statement set for every role.
///
/// Higher roles are the union of the role below and their own grants; the
/// stored sets are complete, so a lookup never walks a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinitions {
    member: StatementSet,
    admin: StatementSet,
    owner: StatementSet,
}

impl RoleDefinitions {
    pub fn standard(registry: &StatementRegistry) -> Result<Self, RegistryError> {
        Self::build(registry, MEMBER_GRANTS, ADMIN_GRANTS, OWNER_GRANTS)
    }

    pub fn build(
        registry: &StatementRegistry,
        member: &[StatementDeclaration<'_>],
        admin: &[StatementDeclaration<'_>],
        owner: &[StatementDeclaration<'_>],
    ) -> Result<Self, RegistryError> {
        let member = registry.parse_grants(member)?;
        let admin = member.union(&registry.parse_grants(admin)?);
        let owner = admin.union(&registry.parse_grants(owner)?);
        Ok(Self { member, admin, owner })
    }

    pub fn statements(&self, role: Role) -> &StatementSet {
        match role {
            Role::Member => &self.member,
            Role::Admin => &self.admin,
            Role::Owner => &self.owner,
        }
    }
}
