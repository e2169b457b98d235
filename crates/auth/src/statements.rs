//! Permission statement registry.
//!
//! Statements are declared as plain `(resource, [action, ...])` tables and
//! parsed once at startup. Any name outside the closed enumerations fails
//! construction, so request-time lookups on enum values cannot fail.

use serde::Serialize;
use serde::ser::SerializeMap;
use thiserror::Error;

use crate::permissions::{Action, ActionSet, Resource};

/// Raw statement declaration: resource name and its action names.
pub type StatementDeclaration<'a> = (&'a str, &'a [&'a str]);

/// Every resource the API exposes with the actions it supports.
pub const STATEMENTS: &[StatementDeclaration<'static>] = &[
    ("workout", &["read", "create", "update", "delete"]),
    ("exercise", &["read", "create", "update", "delete"]),
    ("athlete", &["read", "create", "update", "delete"]),
    ("session", &["read", "create", "update", "delete"]),
    ("personalRecord", &["read", "create", "update", "delete"]),
    ("complex", &["read", "create", "update", "delete"]),
    ("organization", &["read", "update", "delete"]),
    ("member", &["read", "create", "update", "delete"]),
    ("invitation", &["read", "create", "delete"]),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("unknown action '{action}' for resource '{resource}'")]
    UnknownAction { resource: String, action: String },

    #[error("resource '{0}' is declared more than once")]
    DuplicateResource(String),

    #[error("resource '{0}' declares no actions")]
    EmptyStatement(String),

    #[error("resource '{0}' is missing from the registry")]
    MissingResource(String),

    #[error("grant '{resource}:{action}' is outside the registered statement")]
    GrantOutsideStatement { resource: String, action: String },
}

/// Resource → action-set mapping, one slot per [`Resource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementSet {
    grants: [ActionSet; Resource::COUNT],
}

impl StatementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration table into a statement set.
    ///
    /// Duplicate resources are rejected; resources absent from the table get
    /// an empty action set.
    pub fn parse(declarations: &[StatementDeclaration<'_>]) -> Result<Self, RegistryError> {
        let mut set = StatementSet::new();
        let mut seen = [false; Resource::COUNT];

        for (resource_name, action_names) in declarations {
            let resource: Resource = resource_name
                .parse()
                .map_err(|_| RegistryError::UnknownResource(resource_name.to_string()))?;

            if seen[resource.index()] {
                return Err(RegistryError::DuplicateResource(resource_name.to_string()));
            }
            seen[resource.index()] = true;

            for action_name in action_names.iter() {
                let action: Action =
                    action_name
                        .parse()
                        .map_err(|_| RegistryError::UnknownAction {
                            resource: resource_name.to_string(),
                            action: action_name.to_string(),
                        })?;
                set.grant(resource, action);
            }
        }

        Ok(set)
    }

    pub fn grant(&mut self, resource: Resource, action: Action) {
        self.grants[resource.index()].insert(action);
    }

    pub fn actions(&self, resource: Resource) -> ActionSet {
        self.grants[resource.index()]
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.actions(resource).contains(action)
    }

    pub fn union(&self, other: &StatementSet) -> StatementSet {
        let mut out = *self;
        for resource in Resource::ALL {
            out.grants[resource.index()] = self.actions(resource).union(other.actions(resource));
        }
        out
    }

    pub fn is_subset(&self, other: &StatementSet) -> bool {
        Resource::ALL
            .into_iter()
            .all(|r| self.actions(r).is_subset(&other.actions(r)))
    }

    /// Non-empty `(resource, actions)` entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, ActionSet)> + '_ {
        Resource::ALL
            .into_iter()
            .map(move |r| (r, self.actions(r)))
            .filter(|(_, actions)| !actions.is_empty())
    }
}

impl Serialize for StatementSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (resource, actions) in self.iter() {
            map.serialize_entry(resource.as_str(), &actions)?;
        }
        map.end()
    }
}

/// The validated registry of every resource and its allowed actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRegistry {
    statements: StatementSet,
}

impl StatementRegistry {
    /// Build the registry from [`STATEMENTS`].
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_declarations(STATEMENTS)
    }

    /// Build a registry from raw declarations.
    ///
    /// Every [`Resource`] must be declared with at least one action.
    pub fn from_declarations(
        declarations: &[StatementDeclaration<'_>],
    ) -> Result<Self, RegistryError> {
        let statements = StatementSet::parse(declarations)?;

        for resource in Resource::ALL {
            if statements.actions(resource).is_empty() {
                let declared = declarations.iter().any(|(name, _)| *name == resource.as_str());
                return Err(if declared {
                    RegistryError::EmptyStatement(resource.as_str().to_string())
                } else {
                    RegistryError::MissingResource(resource.as_str().to_string())
                });
            }
        }

        Ok(Self { statements })
    }

    pub fn statements(&self) -> &StatementSet {
        &self.statements
    }

    pub fn actions(&self, resource: Resource) -> ActionSet {
        self.statements.actions(resource)
    }

    /// Parse a grant table and check it stays within the registry.
    pub fn parse_grants(
        &self,
        declarations: &[StatementDeclaration<'_>],
    ) -> Result<StatementSet, RegistryError> {
        let grants = StatementSet::parse(declarations)?;
        for (resource, actions) in grants.iter() {
            if let Some(action) = actions.iter().find(|a| !self.actions(resource).contains(*a)) {
                return Err(RegistryError::GrantOutsideStatement {
                    resource: resource.as_str().to_string(),
                    action: action.as_str().to_string(),
                });
            }
        }
        Ok(grants)
    }
}
