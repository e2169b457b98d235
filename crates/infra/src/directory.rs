//! Organization directory: organizations, memberships and invitations.
//!
//! This is the identity/organization store the access layer consults per
//! request. It owns the user → role binding for each organization.
//!
//! # Invariants
//! - A user has at most one membership (one role) per organization.
//! - Organization slugs are unique. Derived slugs always pass slug validation,
//!   falling back to an id suffix when a name yields no usable or free slug.
//! - Nobody grants a role above their own, or changes/removes a member who
//!   outranks them.
//! - An organization always keeps at least one owner.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coachboard_auth::{Membership, MembershipSource, Principal, Role, SessionError};
use coachboard_core::{DomainError, DomainResult, InvitationId, OrganizationId, UserId};

const MAX_ORGANIZATION_NAME_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub role: Role,
    pub inviter: UserId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    organizations: BTreeMap<OrganizationId, Organization>,
    members: BTreeMap<(OrganizationId, UserId), MemberRecord>,
    invitations: BTreeMap<InvitationId, Invitation>,
}

impl DirectoryState {
    fn owner_count(&self, organization_id: OrganizationId) -> usize {
        self.members_of(organization_id)
            .filter(|m| m.role == Role::Owner)
            .count()
    }

    fn members_of(&self, organization_id: OrganizationId) -> impl Iterator<Item = &MemberRecord> {
        self.members
            .iter()
            .filter(move |((o, _), _)| *o == organization_id)
            .map(|(_, m)| m)
    }

    fn slug_taken(&self, slug: &str) -> bool {
        self.organizations.values().any(|o| o.slug == slug)
    }

    /// Shared checks for changing or removing `target` as `actor`.
    fn ensure_can_manage(&self, actor: &Principal, target: &MemberRecord) -> DomainResult<()> {
        if target.role > actor.role {
            return Err(DomainError::RoleEscalation);
        }
        Ok(())
    }
}

/// In-memory directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&DirectoryState) -> T) -> T {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Create an organization; the creator becomes its owner.
    pub fn create_organization(
        &self,
        creator: UserId,
        creator_email: &str,
        name: &str,
        slug: Option<&str>,
    ) -> DomainResult<Organization> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_ORGANIZATION_NAME_LEN {
            return Err(DomainError::validation(format!(
                "organization name must be 1-{MAX_ORGANIZATION_NAME_LEN} characters"
            )));
        }
        let id = OrganizationId::new();
        let explicit = slug.map(|s| s.trim().to_string());
        if let Some(slug) = &explicit {
            validate_slug(slug)?;
        }

        let mut state = self.write();
        let slug = match explicit {
            Some(slug) if state.slug_taken(&slug) => {
                return Err(DomainError::conflict(format!("slug '{slug}' is taken")));
            }
            Some(slug) => slug,
            None => {
                let derived = derive_slug(name, id);
                if state.slug_taken(&derived) {
                    with_id_suffix(&derived, id)
                } else {
                    derived
                }
            }
        };

        let now = Utc::now();
        let organization = Organization {
            id,
            name: name.to_string(),
            slug,
            created_at: now,
        };
        state
            .organizations
            .insert(organization.id, organization.clone());
        state.members.insert(
            (organization.id, creator),
            MemberRecord {
                organization_id: organization.id,
                user_id: creator,
                email: normalize_email(creator_email),
                role: Role::Owner,
                joined_at: now,
            },
        );

        tracing::info!(organization_id = %organization.id, user_id = %creator, "organization created");
        Ok(organization)
    }

    pub fn organization(&self, organization_id: OrganizationId) -> Option<Organization> {
        self.read(|s| s.organizations.get(&organization_id).cloned())
    }

    /// Organizations `user_id` belongs to, with their role in each.
    pub fn organizations_for(&self, user_id: UserId) -> Vec<(Organization, Role)> {
        self.read(|s| {
            s.members
                .values()
                .filter(|m| m.user_id == user_id)
                .filter_map(|m| {
                    s.organizations
                        .get(&m.organization_id)
                        .map(|o| (o.clone(), m.role))
                })
                .collect()
        })
    }

    pub fn members(&self, organization_id: OrganizationId) -> Vec<MemberRecord> {
        self.read(|s| s.members_of(organization_id).cloned().collect())
    }

    pub fn invitations(&self, organization_id: OrganizationId) -> Vec<Invitation> {
        self.read(|s| {
            s.invitations
                .values()
                .filter(|i| i.organization_id == organization_id)
                .cloned()
                .collect()
        })
    }

    /// Invite `email` into the actor's organization with `role`.
    pub fn invite(&self, actor: &Principal, email: &str, role: Role) -> DomainResult<Invitation> {
        if role > actor.role {
            return Err(DomainError::RoleEscalation);
        }
        let email = normalize_email(email);
        validate_email(&email)?;

        let mut state = self.write();
        let organization_id = actor.organization_id;

        if state.members_of(organization_id).any(|m| m.email == email) {
            return Err(DomainError::conflict("already a member"));
        }
        if state.invitations.values().any(|i| {
            i.organization_id == organization_id
                && i.email == email
                && i.status == InvitationStatus::Pending
        }) {
            return Err(DomainError::conflict("invitation already pending"));
        }

        let invitation = Invitation {
            id: InvitationId::new(),
            organization_id,
            email,
            role,
            inviter: actor.user_id,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };
        state.invitations.insert(invitation.id, invitation.clone());

        tracing::info!(%organization_id, invitation_id = %invitation.id, role = %role, "invitation created");
        Ok(invitation)
    }

    pub fn cancel_invitation(
        &self,
        organization_id: OrganizationId,
        invitation_id: InvitationId,
    ) -> DomainResult<Invitation> {
        let mut state = self.write();
        let invitation = state
            .invitations
            .get_mut(&invitation_id)
            .filter(|i| i.organization_id == organization_id)
            .ok_or_else(DomainError::not_found("invitation"))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(DomainError::conflict("invitation is no longer pending"));
        }
        invitation.status = InvitationStatus::Canceled;
        Ok(invitation.clone())
    }

    /// Accept an invitation addressed to `email`.
    ///
    /// An invitation for a different email is reported as not found.
    pub fn accept_invitation(
        &self,
        invitation_id: InvitationId,
        user_id: UserId,
        email: &str,
    ) -> DomainResult<MemberRecord> {
        let email = normalize_email(email);
        let mut state = self.write();

        let invitation = state
            .invitations
            .get(&invitation_id)
            .filter(|i| i.email == email)
            .cloned()
            .ok_or_else(DomainError::not_found("invitation"))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(DomainError::conflict("invitation is no longer pending"));
        }
        let key = (invitation.organization_id, user_id);
        if state.members.contains_key(&key) {
            return Err(DomainError::conflict("already a member"));
        }

        let member = MemberRecord {
            organization_id: invitation.organization_id,
            user_id,
            email,
            role: invitation.role,
            joined_at: Utc::now(),
        };
        state.members.insert(key, member.clone());
        if let Some(i) = state.invitations.get_mut(&invitation_id) {
            i.status = InvitationStatus::Accepted;
        }

        tracing::info!(
            organization_id = %member.organization_id,
            %user_id,
            role = %member.role,
            "invitation accepted"
        );
        Ok(member)
    }

    pub fn update_member_role(
        &self,
        actor: &Principal,
        target: UserId,
        role: Role,
    ) -> DomainResult<MemberRecord> {
        if role > actor.role {
            return Err(DomainError::RoleEscalation);
        }

        let mut state = self.write();
        let key = (actor.organization_id, target);
        let current = state.members.get(&key).cloned().ok_or_else(DomainError::not_found("member"))?;
        state.ensure_can_manage(actor, &current)?;

        if current.role == Role::Owner
            && role != Role::Owner
            && state.owner_count(actor.organization_id) == 1
        {
            return Err(DomainError::invariant("an organization needs at least one owner"));
        }

        let updated = MemberRecord { role, ..current };
        state.members.insert(key, updated.clone());
        Ok(updated)
    }

    pub fn remove_member(&self, actor: &Principal, target: UserId) -> DomainResult<MemberRecord> {
        let mut state = self.write();
        let key = (actor.organization_id, target);
        let current = state.members.get(&key).cloned().ok_or_else(DomainError::not_found("member"))?;
        state.ensure_can_manage(actor, &current)?;

        if current.role == Role::Owner && state.owner_count(actor.organization_id) == 1 {
            return Err(DomainError::invariant("an organization needs at least one owner"));
        }

        state.members.remove(&key);
        tracing::info!(organization_id = %actor.organization_id, user_id = %target, "member removed");
        Ok(current)
    }
}

#[async_trait]
impl MembershipSource for InMemoryDirectory {
    async fn memberships(&self, user_id: UserId) -> Result<Vec<Membership>, SessionError> {
        Ok(self.read(|s| {
            s.members
                .values()
                .filter(|m| m.user_id == user_id)
                .map(|m| Membership {
                    organization_id: m.organization_id,
                    role: m.role,
                })
                .collect()
        }))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> DomainResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::validation("invalid email")),
    }
}

const MAX_SLUG_LEN: usize = 48;
const SLUG_SUFFIX_LEN: usize = 8;

/// ASCII slug of a name: common Latin accents are folded, every other run of
/// non-alphanumerics becomes one hyphen.
fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.to_lowercase().chars() {
        match fold_latin(c) {
            Some(folded) => slug.push_str(folded),
            None if c.is_ascii_alphanumeric() => slug.push(c),
            None if !slug.is_empty() && !slug.ends_with('-') => slug.push('-'),
            None => {}
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn fold_latin(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    })
}

/// Cut at the last hyphen that fits, or hard at `max` without one.
fn truncate_slug(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    let head = &slug[..max];
    match head.rfind('-') {
        Some(cut) if cut > 0 => head[..cut].to_string(),
        _ => head.trim_end_matches('-').to_string(),
    }
}

/// Slug derived from an organization name; always passes `validate_slug`.
fn derive_slug(name: &str, id: OrganizationId) -> String {
    let slug = truncate_slug(&slugify(name), MAX_SLUG_LEN);
    if slug.len() < 2 {
        format!("org-{}", id_suffix(id))
    } else {
        slug
    }
}

fn with_id_suffix(slug: &str, id: OrganizationId) -> String {
    let base = truncate_slug(slug, MAX_SLUG_LEN - SLUG_SUFFIX_LEN - 1);
    format!("{base}-{}", id_suffix(id))
}

/// Trailing (random) hex digits of a UUIDv7.
fn id_suffix(id: OrganizationId) -> String {
    let hex = id.as_uuid().simple().to_string();
    hex[hex.len() - SLUG_SUFFIX_LEN..].to_string()
}

fn validate_slug(slug: &str) -> DomainResult<()> {
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !(2..=MAX_SLUG_LEN).contains(&slug.len())
        || !valid_chars
        || slug.starts_with('-')
        || slug.ends_with('-')
    {
        return Err(DomainError::validation(
            "slug must be 2-48 characters of a-z, 0-9 and inner hyphens",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(directory: &InMemoryDirectory, user_id: UserId, org: OrganizationId) -> Principal {
        let role = directory
            .members(org)
            .into_iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
            .unwrap();
        Principal {
            user_id,
            organization_id: org,
            role,
        }
    }

    /// Owner creates an organization and brings `email` in with `role`.
    fn with_member(role: Role) -> (InMemoryDirectory, OrganizationId, UserId, UserId) {
        let directory = InMemoryDirectory::new();
        let owner = UserId::new();
        let org = directory
            .create_organization(owner, "owner@example.com", "Barbell Club", None)
            .unwrap();

        let invitee = UserId::new();
        let invitation = directory
            .invite(&principal(&directory, owner, org.id), "Invitee@Example.com", role)
            .unwrap();
        directory
            .accept_invitation(invitation.id, invitee, "invitee@example.com")
            .unwrap();

        (directory, org.id, owner, invitee)
    }

    #[test]
    fn creator_becomes_owner() {
        let directory = InMemoryDirectory::new();
        let user = UserId::new();
        let org = directory
            .create_organization(user, "coach@example.com", "North Side Lifting", None)
            .unwrap();

        assert_eq!(org.slug, "north-side-lifting");
        assert_eq!(directory.organizations_for(user), vec![(org.clone(), Role::Owner)]);
        assert_eq!(directory.organization(org.id), Some(org));
    }

    #[test]
    fn slugs_are_validated_and_unique() {
        let directory = InMemoryDirectory::new();
        let user = UserId::new();

        directory
            .create_organization(user, "a@example.com", "Club", Some("club"))
            .unwrap();
        assert!(matches!(
            directory.create_organization(user, "a@example.com", "Club", Some("club")),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            directory.create_organization(user, "a@example.com", "Club", Some("Bad Slug")),
            Err(DomainError::Validation(_))
        ));
        assert!(directory.create_organization(user, "a@example.com", "  ", None).is_err());
    }

    fn derived(directory: &InMemoryDirectory, name: &str) -> Organization {
        directory
            .create_organization(UserId::new(), "coach@example.com", name, None)
            .unwrap()
    }

    #[test]
    fn long_names_are_cut_at_a_hyphen() {
        let org = derived(
            &InMemoryDirectory::new(),
            "Northern California Olympic Weightlifting Association",
        );
        assert_eq!(org.slug, "northern-california-olympic-weightlifting");
        assert!(validate_slug(&org.slug).is_ok());
    }

    #[test]
    fn accents_are_folded() {
        let org = derived(&InMemoryDirectory::new(), "Équipe Élite");
        assert_eq!(org.slug, "equipe-elite");
    }

    #[test]
    fn names_without_a_usable_slug_fall_back_to_the_id() {
        let directory = InMemoryDirectory::new();
        for name in ["A", "東京ジム", "!!!"] {
            let org = derived(&directory, name);
            assert_eq!(org.slug, format!("org-{}", id_suffix(org.id)), "{name}");
            assert!(validate_slug(&org.slug).is_ok(), "{name}");
        }
    }

    #[test]
    fn taken_derived_slugs_get_an_id_suffix() {
        let directory = InMemoryDirectory::new();
        let first = derived(&directory, "Iron Temple");
        let second = derived(&directory, "Iron Temple");

        assert_eq!(first.slug, "iron-temple");
        assert_eq!(second.slug, format!("iron-temple-{}", id_suffix(second.id)));

        let long = "Northern California Olympic Weightlifting Association";
        derived(&directory, long);
        let again = derived(&directory, long);
        assert!(again.slug.len() <= MAX_SLUG_LEN);
        assert!(validate_slug(&again.slug).is_ok());
        assert!(again.slug.ends_with(&id_suffix(again.id)));
    }

    #[tokio::test]
    async fn accepted_invitation_becomes_membership() {
        let (directory, org, _owner, invitee) = with_member(Role::Member);

        let memberships = directory.memberships(invitee).await.unwrap();
        assert_eq!(
            memberships,
            vec![Membership {
                organization_id: org,
                role: Role::Member
            }]
        );
        assert_eq!(directory.invitations(org)[0].status, InvitationStatus::Accepted);
    }

    #[test]
    fn invitation_for_another_email_is_not_found() {
        let directory = InMemoryDirectory::new();
        let owner = UserId::new();
        let org = directory
            .create_organization(owner, "owner@example.com", "Club", None)
            .unwrap();
        let invitation = directory
            .invite(&principal(&directory, owner, org.id), "a@example.com", Role::Member)
            .unwrap();

        assert_eq!(
            directory.accept_invitation(invitation.id, UserId::new(), "b@example.com"),
            Err(DomainError::NotFound("invitation"))
        );
    }

    #[test]
    fn canceled_invitation_cannot_be_accepted() {
        let directory = InMemoryDirectory::new();
        let owner = UserId::new();
        let org = directory
            .create_organization(owner, "owner@example.com", "Club", None)
            .unwrap();
        let invitation = directory
            .invite(&principal(&directory, owner, org.id), "a@example.com", Role::Admin)
            .unwrap();

        directory.cancel_invitation(org.id, invitation.id).unwrap();
        assert!(matches!(
            directory.accept_invitation(invitation.id, UserId::new(), "a@example.com"),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(
            directory.cancel_invitation(OrganizationId::new(), invitation.id),
            Err(DomainError::NotFound("invitation"))
        );
    }

    #[test]
    fn duplicate_invitations_are_rejected() {
        let (directory, org, owner, _invitee) = with_member(Role::Member);
        let actor = principal(&directory, owner, org);

        assert!(matches!(
            directory.invite(&actor, "invitee@example.com", Role::Member),
            Err(DomainError::Conflict(_))
        ));

        directory.invite(&actor, "new@example.com", Role::Member).unwrap();
        assert!(matches!(
            directory.invite(&actor, "NEW@example.com", Role::Member),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            directory.invite(&actor, "not-an-email", Role::Member),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn admins_cannot_escalate_or_touch_owners() {
        let (directory, org, owner, admin) = with_member(Role::Admin);
        let actor = principal(&directory, admin, org);

        assert_eq!(
            directory.invite(&actor, "x@example.com", Role::Owner),
            Err(DomainError::RoleEscalation)
        );
        assert_eq!(
            directory.update_member_role(&actor, admin, Role::Owner),
            Err(DomainError::RoleEscalation)
        );
        assert_eq!(
            directory.update_member_role(&actor, owner, Role::Member),
            Err(DomainError::RoleEscalation)
        );
        assert_eq!(directory.remove_member(&actor, owner), Err(DomainError::RoleEscalation));
    }

    #[test]
    fn last_owner_is_kept() {
        let (directory, org, owner, member) = with_member(Role::Member);
        let actor = principal(&directory, owner, org);

        assert!(matches!(
            directory.update_member_role(&actor, owner, Role::Admin),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(matches!(
            directory.remove_member(&actor, owner),
            Err(DomainError::InvariantViolation(_))
        ));

        directory.update_member_role(&actor, member, Role::Owner).unwrap();
        let demoted = directory.update_member_role(&actor, owner, Role::Admin).unwrap();
        assert_eq!(demoted.role, Role::Admin);
    }

    #[test]
    fn removed_member_loses_membership() {
        let (directory, org, owner, member) = with_member(Role::Member);
        let actor = principal(&directory, owner, org);

        directory.remove_member(&actor, member).unwrap();
        assert!(directory.organizations_for(member).is_empty());
        assert_eq!(directory.remove_member(&actor, member), Err(DomainError::NotFound("member")));
    }
}
