use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};

use coachboard_auth::{Action, Resource, Role, RouteMetadata};
use coachboard_core::{DomainError, InvitationId};
use coachboard_infra::MemberRecord;

use super::RouteDeclaration;
use crate::app::dto::{CreateOrganizationRequest, Items, OrganizationWithRole};
use crate::app::errors::{ApiError, ApiJson, parse_id};
use crate::app::services::AppServices;
use crate::context::{CurrentOrganization, CurrentUser};

pub fn routes() -> Vec<RouteDeclaration> {
    vec![
        RouteDeclaration::get("/organizations", RouteMetadata::exempt(), list_organizations),
        RouteDeclaration::post("/organizations", RouteMetadata::exempt(), create_organization),
        RouteDeclaration::post(
            "/invitations/:id/accept",
            RouteMetadata::exempt(),
            accept_invitation,
        ),
        RouteDeclaration::get(
            "/organization",
            RouteMetadata::guarded(Resource::Organization, &[Action::Read]),
            current_organization,
        ),
    ]
}

/// Organizations the caller belongs to; needs no active organization.
pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(identity): CurrentUser,
) -> Json<Items<OrganizationWithRole>> {
    let items: Vec<_> = services
        .directory
        .organizations_for(identity.user_id())
        .into_iter()
        .map(|(organization, role)| OrganizationWithRole { organization, role })
        .collect();
    Json(items.into())
}

pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(identity): CurrentUser,
    ApiJson(body): ApiJson<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationWithRole>), ApiError> {
    let session = identity.session();
    let organization = services.directory.create_organization(
        session.user_id,
        &session.email,
        &body.name,
        body.slug.as_deref(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(OrganizationWithRole {
            organization,
            role: Role::Owner,
        }),
    ))
}

pub async fn accept_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MemberRecord>, ApiError> {
    let id: InvitationId = parse_id(&id)?;
    let session = identity.session();
    let member = services
        .directory
        .accept_invitation(id, session.user_id, &session.email)?;
    Ok(Json(member))
}

pub async fn current_organization(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
) -> Result<Json<OrganizationWithRole>, ApiError> {
    let organization = services
        .directory
        .organization(org.organization_id())
        .ok_or_else(DomainError::not_found("organization"))?;

    Ok(Json(OrganizationWithRole {
        organization,
        role: org.principal().role,
    }))
}
