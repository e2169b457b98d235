//! Read-only views over the access-control configuration.

use std::sync::Arc;

use axum::{Json, extract::Extension};

use coachboard_auth::{
    Action, AuthorizationExplanation, Permission, Resource, Role, RouteMetadata,
    explain_authorization,
};

use super::RouteDeclaration;
use crate::app::dto::{AccessQuery, Items, ResourceActions, RoleStatements};
use crate::app::errors::{ApiError, ApiQuery};
use crate::app::services::AppServices;
use crate::context::CurrentOrganization;

pub fn routes() -> Vec<RouteDeclaration> {
    let read = RouteMetadata::guarded(Resource::Organization, &[Action::Read]);
    vec![
        RouteDeclaration::get("/organization/roles", read, list_roles),
        RouteDeclaration::get("/organization/access", read, explain_access),
    ]
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Items<RoleStatements>> {
    let roles: Vec<_> = Role::ALL
        .into_iter()
        .map(|role| RoleStatements {
            role,
            description: role.description(),
            statements: services
                .access
                .statements(role)
                .iter()
                .map(|(resource, actions)| ResourceActions { resource, actions })
                .collect(),
            permissions: services
                .access
                .permissions(role)
                .iter()
                .map(Permission::to_string)
                .collect(),
        })
        .collect();
    Json(roles.into())
}

/// Whether the caller's role in the active organization allows a pair.
pub async fn explain_access(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    ApiQuery(query): ApiQuery<AccessQuery>,
) -> Result<Json<AuthorizationExplanation>, ApiError> {
    let resource = query
        .resource
        .parse::<Resource>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let action = query
        .action
        .parse::<Action>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(explain_authorization(
        &services.access,
        org.principal().role,
        Permission::new(resource, action),
    )))
}
