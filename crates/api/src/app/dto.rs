//! Request and response bodies that are not domain types.

use serde::{Deserialize, Serialize};

use coachboard_auth::{ActionSet, Membership, Resource, Role};
use coachboard_core::{OrganizationId, UserId};
use coachboard_infra::Organization;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: Role,
}

fn default_invite_role() -> Role {
    Role::Member
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CompetitorStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub resource: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: UserId,
    pub email: String,
    pub active_organization_id: Option<OrganizationId>,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationWithRole {
    #[serde(flatten)]
    pub organization: Organization,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RoleStatements {
    pub role: Role,
    pub description: &'static str,
    pub statements: Vec<ResourceActions>,
    /// Flattened `resource:action` grants.
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResourceActions {
    pub resource: Resource,
    pub actions: ActionSet,
}

#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for Items<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}
