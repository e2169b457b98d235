use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};

use coachboard_auth::{Action, Resource, RouteMetadata};
use coachboard_core::RecordId;
use coachboard_infra::{NewRecord, Record, RecordChanges};

use super::RouteDeclaration;
use crate::app::dto::{CompetitorStatusRequest, Items};
use crate::app::errors::{ApiError, ApiJson, parse_id};
use crate::app::services::AppServices;
use crate::context::CurrentOrganization;

/// Collection path for each business resource.
pub const COLLECTIONS: [(&str, Resource); 6] = [
    ("/workouts", Resource::Workout),
    ("/exercises", Resource::Exercise),
    ("/athletes", Resource::Athlete),
    ("/sessions", Resource::Session),
    ("/personal-records", Resource::PersonalRecord),
    ("/complexes", Resource::Complex),
];

pub fn routes() -> Vec<RouteDeclaration> {
    let mut routes: Vec<RouteDeclaration> = COLLECTIONS
        .iter()
        .flat_map(|&(base, kind)| collection(base, kind))
        .collect();

    routes.push(RouteDeclaration::put(
        "/athletes/:id/competitor-status",
        RouteMetadata::guarded(Resource::Athlete, &[Action::Update]),
        set_competitor_status,
    ));
    routes
}

fn collection(base: &str, kind: Resource) -> Vec<RouteDeclaration> {
    let item = format!("{base}/:id");
    let requires = |action: Action| RouteMetadata::guarded(kind, &[action]);

    vec![
        RouteDeclaration::get(base, requires(Action::Read), list_records),
        RouteDeclaration::post(base, requires(Action::Create), create_record),
        RouteDeclaration::get(item.clone(), requires(Action::Read), get_record),
        RouteDeclaration::patch(item.clone(), requires(Action::Update), update_record),
        RouteDeclaration::delete(item, requires(Action::Delete), delete_record),
    ]
    .into_iter()
    .map(|route| route.with_extension(kind))
    .collect()
}

pub async fn list_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<Resource>,
    CurrentOrganization(org): CurrentOrganization,
) -> Json<Items<Record>> {
    Json(services.records.list(org.organization_id(), kind).into())
}

pub async fn create_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<Resource>,
    CurrentOrganization(org): CurrentOrganization,
    ApiJson(body): ApiJson<NewRecord>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let principal = org.principal();
    let record = services
        .records
        .create(principal.organization_id, kind, principal.user_id, body)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<Resource>,
    CurrentOrganization(org): CurrentOrganization,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let id: RecordId = parse_id(&id)?;
    Ok(Json(services.records.get(org.organization_id(), kind, id)?))
}

pub async fn update_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<Resource>,
    CurrentOrganization(org): CurrentOrganization,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RecordChanges>,
) -> Result<Json<Record>, ApiError> {
    let id: RecordId = parse_id(&id)?;
    Ok(Json(services.records.update(org.organization_id(), kind, id, body)?))
}

pub async fn delete_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<Resource>,
    CurrentOrganization(org): CurrentOrganization,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: RecordId = parse_id(&id)?;
    services.records.delete(org.organization_id(), kind, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_competitor_status(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentOrganization(org): CurrentOrganization,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CompetitorStatusRequest>,
) -> Result<Json<Record>, ApiError> {
    let id: RecordId = parse_id(&id)?;
    let record = services
        .records
        .set_competitor_status(org.organization_id(), id, &body.status)?;
    Ok(Json(record))
}
