use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Named entity subject to access control.
///
/// The first six variants are the business resources; the remaining ones
/// gate organization management (settings, members, invitations).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Workout,
    Exercise,
    Athlete,
    Session,
    PersonalRecord,
    Complex,
    Organization,
    Member,
    Invitation,
}

impl Resource {
    pub const COUNT: usize = 9;

    pub const ALL: [Resource; Self::COUNT] = [
        Resource::Workout,
        Resource::Exercise,
        Resource::Athlete,
        Resource::Session,
        Resource::PersonalRecord,
        Resource::Complex,
        Resource::Organization,
        Resource::Member,
        Resource::Invitation,
    ];

    pub const BUSINESS: [Resource; 6] = [
        Resource::Workout,
        Resource::Exercise,
        Resource::Athlete,
        Resource::Session,
        Resource::PersonalRecord,
        Resource::Complex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Workout => "workout",
            Resource::Exercise => "exercise",
            Resource::Athlete => "athlete",
            Resource::Session => "session",
            Resource::PersonalRecord => "personalRecord",
            Resource::Complex => "complex",
            Resource::Organization => "organization",
            Resource::Member => "member",
            Resource::Invitation => "invitation",
        }
    }

    pub fn is_business(&self) -> bool {
        Self::BUSINESS.contains(self)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Resource {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// One of the four canonical actions. The set is closed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl FromStr for Action {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// A name that is not part of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name '{0}'")]
pub struct UnknownName(pub String);

macro_rules! impl_str_serde {
    ($t:ty) => {
        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_str_serde!(Resource);
impl_str_serde!(Action);

/// Compact set of actions (one bit per [`Action`]).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(u8);

impl ActionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Action::ALL.into_iter().collect()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    pub fn insert(&mut self, action: Action) {
        self.0 |= action.bit();
    }

    pub fn union(self, other: ActionSet) -> ActionSet {
        ActionSet(self.0 | other.0)
    }

    pub fn is_subset(&self, other: &ActionSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut set = ActionSet::empty();
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl Serialize for ActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// A `(resource, action)` pair, rendered as `resource:action`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
        assert_eq!("personalRecord".parse::<Resource>().unwrap(), Resource::PersonalRecord);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!("archive".parse::<Action>(), Err(UnknownName("archive".to_string())));
        assert!("Read".parse::<Action>().is_err());
    }

    #[test]
    fn action_set_operations() {
        let read_only: ActionSet = [Action::Read].into_iter().collect();
        let crud = ActionSet::all();

        assert!(read_only.is_subset(&crud));
        assert!(!crud.is_subset(&read_only));
        assert!(read_only.contains(Action::Read));
        assert!(!read_only.contains(Action::Delete));
        assert_eq!(read_only.union(crud), crud);
        assert_eq!(crud.iter().count(), 4);
    }

    #[test]
    fn permission_display() {
        let p = Permission::new(Resource::PersonalRecord, Action::Create);
        assert_eq!(p.to_string(), "personalRecord:create");
    }

    #[test]
    fn resource_serializes_as_camel_case_name() {
        let json = serde_json::to_string(&Resource::PersonalRecord).unwrap();
        assert_eq!(json, "\"personalRecord\"");
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Resource::PersonalRecord);
    }
}
