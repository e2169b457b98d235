use axum::{Json, http::StatusCode};

use coachboard_auth::RouteMetadata;

use super::RouteDeclaration;
use crate::app::dto::WhoAmI;
use crate::context::CurrentUser;

pub fn routes() -> Vec<RouteDeclaration> {
    vec![RouteDeclaration::get("/whoami", RouteMetadata::exempt(), whoami)]
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(CurrentUser(identity): CurrentUser) -> Json<WhoAmI> {
    let session = identity.session();
    Json(WhoAmI {
        user_id: session.user_id,
        email: session.email.clone(),
        active_organization_id: session.active_organization_id,
        memberships: session.memberships.clone(),
    })
}
