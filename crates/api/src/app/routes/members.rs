use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};

use coachboard_auth::{Action, Resource, RouteMetadata};
use coachboard_core::{InvitationId, UserId};
use coachboard_infra::{Invitation, MemberRecord};

use super::RouteDeclaration;
use crate::app::dto::{InviteRequest, Items, UpdateRoleRequest};
use crate::app::errors::{ApiError, ApiJson, parse_id};
use crate::app::services::AppServices;
use crate::context::CurrentOrganization;

pub fn routes() -> Vec<RouteDeclaration> {
    let member = |action: Action| RouteMetadata::guarded(Resource::Member, &[action]);
    let invitation = |action: Action| RouteMetadata::guarded(Resource::Invitation, &[action]);

    vec![
        RouteDeclaration::get("/organization/members", member(Action::Read), list_members),
        RouteDeclaration::patch(
            "/organization/members/:user_id",
            member(Action::Update),
            update_member_role,
        ),
        RouteDeclaration::delete(
            "/organization/members/:user_id",
            member(Action::Delete),
            remove_member,
        ),
        RouteDeclaration::get(
            "/organization/invitations",
            invitation(Action::Read),
            list_invitations,
        ),
        RouteDeclaration::post(
            "/organization/invitations",
            invitation(Action::Create),
            create_invitation,
        ),
        RouteDeclaration::delete(
            "/organization/invitations/:id",
            invitation(Action::Delete),
            cancel_invitation,
        ),
    ]
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
) -> Json<Items<MemberRecord>> {
    Json(services.directory.members(org.organization_id()).into())
}

pub async fn update_member_role(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateRoleRequest>,
) -> Result<Json<MemberRecord>, ApiError> {
    let target: UserId = parse_id(&user_id)?;
    let member = services
        .directory
        .update_member_role(org.principal(), target, body.role)?;
    Ok(Json(member))
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let target: UserId = parse_id(&user_id)?;
    services.directory.remove_member(org.principal(), target)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_invitations(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
) -> Json<Items<Invitation>> {
    Json(services.directory.invitations(org.organization_id()).into())
}

pub async fn create_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    ApiJson(body): ApiJson<InviteRequest>,
) -> Result<(StatusCode, Json<Invitation>), ApiError> {
    let invitation = services
        .directory
        .invite(org.principal(), &body.email, body.role)?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn cancel_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    Path(id): Path<String>,
) -> Result<Json<Invitation>, ApiError> {
    let id: InvitationId = parse_id(&id)?;
    let invitation = services
        .directory
        .cancel_invitation(org.organization_id(), id)?;
    Ok(Json(invitation))
}
