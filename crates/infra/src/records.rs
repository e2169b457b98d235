//! Business records (workouts, exercises, athletes, sessions, personal
//! records, complexes) kept per organization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use coachboard_auth::Resource;
use coachboard_core::{DomainError, DomainResult, OrganizationId, RecordId, UserId};

use crate::read_model::{InMemoryOrganizationStore, OrganizationStore};

const MAX_NAME_LEN: usize = 200;

/// Attribute under which an athlete's competitor status is stored.
pub const COMPETITOR_STATUS: &str = "competitor_status";

/// Allowed competitor statuses for athletes.
pub const COMPETITOR_STATUSES: &[&str] = &["active", "inactive", "injured", "retired"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub organization_id: OrganizationId,
    pub kind: Resource,
    pub name: String,
    pub attributes: Map<String, Value>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRecord {
    pub name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Partial update: absent fields are left unchanged; attributes are merged
/// key by key, and a `null` value removes the key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordChanges {
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

type Store = dyn OrganizationStore<(Resource, RecordId), Record>;

/// Organization-scoped CRUD over business records.
#[derive(Clone)]
pub struct RecordRepository {
    store: Arc<Store>,
}

impl Default for RecordRepository {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl RecordRepository {
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryOrganizationStore::new()),
        }
    }

    pub fn create(
        &self,
        organization_id: OrganizationId,
        kind: Resource,
        created_by: UserId,
        input: NewRecord,
    ) -> DomainResult<Record> {
        ensure_business(kind)?;
        let name = validate_name(&input.name)?;
        let mut attributes = input.attributes;
        validate_attributes(kind, &mut attributes)?;
        let now = Utc::now();

        let record = Record {
            id: RecordId::new(),
            organization_id,
            kind,
            name,
            attributes,
            created_by,
            created_at: now,
            updated_at: now,
        };
        self.store.upsert(organization_id, (kind, record.id), record.clone());

        tracing::debug!(%organization_id, kind = %kind, record_id = %record.id, "record created");
        Ok(record)
    }

    pub fn get(
        &self,
        organization_id: OrganizationId,
        kind: Resource,
        id: RecordId,
    ) -> DomainResult<Record> {
        self.store
            .get(organization_id, &(kind, id))
            .ok_or_else(DomainError::not_found(kind.as_str()))
    }

    /// Records of one kind, oldest first.
    pub fn list(&self, organization_id: OrganizationId, kind: Resource) -> Vec<Record> {
        self.store
            .list(organization_id)
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }

    /// Merge `changes` into the stored record in one step, so a concurrent
    /// delete or update is never overwritten with a stale copy.
    pub fn update(
        &self,
        organization_id: OrganizationId,
        kind: Resource,
        id: RecordId,
        changes: RecordChanges,
    ) -> DomainResult<Record> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let mut attributes = changes.attributes;
        validate_attributes(kind, &mut attributes)?;

        let mut merge = |record: &mut Record| {
            if let Some(name) = &name {
                record.name = name.clone();
            }
            for (key, value) in &attributes {
                if value.is_null() {
                    record.attributes.remove(key);
                } else {
                    record.attributes.insert(key.clone(), value.clone());
                }
            }
            record.updated_at = Utc::now();
        };

        self.store
            .modify(organization_id, &(kind, id), &mut merge)
            .ok_or_else(DomainError::not_found(kind.as_str()))
    }

    pub fn delete(
        &self,
        organization_id: OrganizationId,
        kind: Resource,
        id: RecordId,
    ) -> DomainResult<Record> {
        let removed = self
            .store
            .remove(organization_id, &(kind, id))
            .ok_or_else(DomainError::not_found(kind.as_str()))?;

        tracing::debug!(%organization_id, kind = %kind, record_id = %id, "record deleted");
        Ok(removed)
    }

    /// Set an athlete's competitor status.
    pub fn set_competitor_status(
        &self,
        organization_id: OrganizationId,
        athlete_id: RecordId,
        status: &str,
    ) -> DomainResult<Record> {
        let mut attributes = Map::new();
        attributes.insert(COMPETITOR_STATUS.to_string(), Value::String(status.to_string()));
        self.update(
            organization_id,
            Resource::Athlete,
            athlete_id,
            RecordChanges {
                name: None,
                attributes,
            },
        )
    }
}

fn ensure_business(kind: Resource) -> DomainResult<()> {
    if kind.is_business() {
        Ok(())
    } else {
        Err(DomainError::invariant(format!("'{kind}' is not a record kind")))
    }
}

/// Athlete competitor status must be a known value (normalized in place);
/// `null` clears it.
fn validate_attributes(kind: Resource, attributes: &mut Map<String, Value>) -> DomainResult<()> {
    if kind != Resource::Athlete {
        return Ok(());
    }
    let Some(value) = attributes.get_mut(COMPETITOR_STATUS) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }

    let status = value
        .as_str()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| COMPETITOR_STATUSES.contains(&s.as_str()))
        .ok_or_else(|| {
            DomainError::validation(format!(
                "competitor status must be one of: {}",
                COMPETITOR_STATUSES.join(", ")
            ))
        })?;
    *value = Value::String(status);
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn new_record(name: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            attributes: Map::new(),
        }
    }

    #[test]
    fn create_trims_and_validates_name() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let user = UserId::new();

        let rec = repo
            .create(org, Resource::Workout, user, new_record("  Leg day  "))
            .unwrap();
        assert_eq!(rec.name, "Leg day");
        assert_eq!(rec.created_by, user);

        let err = repo.create(org, Resource::Workout, user, new_record("   ")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(repo.create(org, Resource::Workout, user, new_record(&long)).is_err());
    }

    #[test]
    fn management_resources_are_not_record_kinds() {
        let repo = RecordRepository::in_memory();
        let err = repo
            .create(OrganizationId::new(), Resource::Member, UserId::new(), new_record("x"))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn kinds_and_organizations_are_isolated() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let other = OrganizationId::new();
        let user = UserId::new();

        let workout = repo.create(org, Resource::Workout, user, new_record("A")).unwrap();
        repo.create(org, Resource::Exercise, user, new_record("B")).unwrap();

        assert_eq!(repo.list(org, Resource::Workout), vec![workout.clone()]);
        assert_eq!(
            repo.get(other, Resource::Workout, workout.id),
            Err(DomainError::NotFound("workout"))
        );
        assert_eq!(
            repo.get(org, Resource::Exercise, workout.id),
            Err(DomainError::NotFound("exercise"))
        );
        assert!(repo.delete(other, Resource::Workout, workout.id).is_err());
    }

    #[test]
    fn update_merges_attributes() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let mut attributes = Map::new();
        attributes.insert("sets".to_string(), json!(5));
        attributes.insert("reps".to_string(), json!(5));
        let rec = repo
            .create(
                org,
                Resource::Complex,
                UserId::new(),
                NewRecord {
                    name: "Clean complex".to_string(),
                    attributes,
                },
            )
            .unwrap();

        let mut changes = Map::new();
        changes.insert("reps".to_string(), json!(3));
        changes.insert("sets".to_string(), Value::Null);
        let updated = repo
            .update(
                org,
                Resource::Complex,
                rec.id,
                RecordChanges {
                    name: None,
                    attributes: changes,
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Clean complex");
        assert_eq!(updated.attributes.get("reps"), Some(&json!(3)));
        assert!(updated.attributes.get("sets").is_none());
    }

    #[test]
    fn competitor_status_is_validated() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let athlete = repo
            .create(org, Resource::Athlete, UserId::new(), new_record("Sam"))
            .unwrap();

        let updated = repo.set_competitor_status(org, athlete.id, "Injured").unwrap();
        assert_eq!(updated.attributes.get(COMPETITOR_STATUS), Some(&json!("injured")));

        assert!(repo.set_competitor_status(org, athlete.id, "benched").is_err());
        assert_eq!(
            repo.set_competitor_status(org, RecordId::new(), "active"),
            Err(DomainError::NotFound("athlete"))
        );
    }

    #[test]
    fn generic_writes_cannot_bypass_competitor_status_rules() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let user = UserId::new();

        let mut attributes = Map::new();
        attributes.insert(COMPETITOR_STATUS.to_string(), json!("banana"));
        let err = repo
            .create(
                org,
                Resource::Athlete,
                user,
                NewRecord {
                    name: "Sam".to_string(),
                    attributes: attributes.clone(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let athlete = repo.create(org, Resource::Athlete, user, new_record("Sam")).unwrap();
        let patch = |attributes: Map<String, Value>| {
            repo.update(
                org,
                Resource::Athlete,
                athlete.id,
                RecordChanges {
                    name: None,
                    attributes,
                },
            )
        };

        assert!(matches!(patch(attributes), Err(DomainError::Validation(_))));

        let mut numeric = Map::new();
        numeric.insert(COMPETITOR_STATUS.to_string(), json!(3));
        assert!(matches!(patch(numeric), Err(DomainError::Validation(_))));

        let mut retired = Map::new();
        retired.insert(COMPETITOR_STATUS.to_string(), json!(" Retired "));
        let updated = patch(retired).unwrap();
        assert_eq!(updated.attributes.get(COMPETITOR_STATUS), Some(&json!("retired")));

        let mut cleared = Map::new();
        cleared.insert(COMPETITOR_STATUS.to_string(), Value::Null);
        assert!(patch(cleared).unwrap().attributes.get(COMPETITOR_STATUS).is_none());
    }

    #[test]
    fn other_kinds_keep_free_form_attributes() {
        let repo = RecordRepository::in_memory();
        let mut attributes = Map::new();
        attributes.insert(COMPETITOR_STATUS.to_string(), json!("banana"));
        let rec = repo
            .create(
                OrganizationId::new(),
                Resource::Workout,
                UserId::new(),
                NewRecord {
                    name: "Leg day".to_string(),
                    attributes,
                },
            )
            .unwrap();
        assert_eq!(rec.attributes.get(COMPETITOR_STATUS), Some(&json!("banana")));
    }

    #[test]
    fn update_after_delete_is_not_found() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let rec = repo
            .create(org, Resource::Workout, UserId::new(), new_record("Leg day"))
            .unwrap();
        repo.delete(org, Resource::Workout, rec.id).unwrap();

        let result = repo.update(
            org,
            Resource::Workout,
            rec.id,
            RecordChanges {
                name: Some("Revived".to_string()),
                attributes: Map::new(),
            },
        );
        assert_eq!(result, Err(DomainError::NotFound("workout")));
        assert!(repo.list(org, Resource::Workout).is_empty());
    }

    #[test]
    fn concurrent_patches_keep_every_attribute() {
        let repo = RecordRepository::in_memory();
        let org = OrganizationId::new();
        let rec = repo
            .create(org, Resource::Session, UserId::new(), new_record("Monday"))
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                std::thread::spawn(move || {
                    let mut attributes = Map::new();
                    attributes.insert(format!("slot_{i}"), json!(i));
                    repo.update(
                        org,
                        Resource::Session,
                        rec.id,
                        RecordChanges {
                            name: None,
                            attributes,
                        },
                    )
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = repo.get(org, Resource::Session, rec.id).unwrap();
        assert_eq!(stored.attributes.len(), 16);
    }
}
