//! Per-route authorization guard.
//!
//! Every organization-scoped route is wrapped in [`enforce_route`] with its
//! declared [`RouteMetadata`]. The guard resolves the active organization,
//! checks the caller's role, and only then exposes an
//! [`OrganizationContext`] to the handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

use coachboard_auth::{
    AccessControl, AuthzError, GuardDecision, PermissionGuard, Principal, RouteMetadata,
    resolve_organization,
};
use coachboard_core::OrganizationId;

use crate::app::errors::ApiError;
use crate::context::{IdentityContext, OrganizationContext};

#[derive(Clone)]
pub struct RouteGuard {
    pub access: Arc<AccessControl>,
    pub metadata: RouteMetadata,
    /// `METHOD /path`, for logs and configuration errors.
    pub route: Arc<str>,
    pub organization_header: HeaderName,
}

pub async fn enforce_route(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<IdentityContext>()
        .cloned()
        .ok_or(ApiError::Authz(AuthzError::Unauthenticated))?;

    if guard.metadata.is_exempt() {
        return Ok(next.run(req).await);
    }

    let principal = authorize_request(&guard, &identity, req.headers())?;
    req.extensions_mut().insert(OrganizationContext::new(principal));
    Ok(next.run(req).await)
}

fn authorize_request(
    guard: &RouteGuard,
    identity: &IdentityContext,
    headers: &HeaderMap,
) -> Result<Principal, AuthzError> {
    let user_id = identity.user_id();

    let requested = requested_organization(headers, &guard.organization_header)?;
    let membership = resolve_organization(identity.session(), requested).inspect_err(|_| {
        tracing::info!(%user_id, route = %guard.route, "no active organization for request");
    })?;
    let principal = Principal::new(user_id, membership);

    let decision = PermissionGuard::new(&guard.access).check(&guard.metadata, principal.role);
    match decision {
        GuardDecision::Authorized => {}
        GuardDecision::Denied(permission) => tracing::warn!(
            %user_id,
            organization_id = %principal.organization_id,
            role = %principal.role,
            resource = %permission.resource,
            action = %permission.action,
            route = %guard.route,
            "permission denied"
        ),
        GuardDecision::ConfigError => tracing::error!(
            route = %guard.route,
            "route reached the guard without permission metadata"
        ),
    }
    decision.into_result(&guard.route)?;

    Ok(principal)
}

/// Explicit organization selection from the request header.
///
/// A header that is not a valid organization id selects nothing usable.
fn requested_organization(
    headers: &HeaderMap,
    header: &HeaderName,
) -> Result<Option<OrganizationId>, AuthzError> {
    match headers.get(header) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Some)
            .ok_or(AuthzError::MissingOrganization),
    }
}
