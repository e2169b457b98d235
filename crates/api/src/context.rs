use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use coachboard_auth::{AuthzError, Principal, Session};
use coachboard_core::{OrganizationId, UserId};

use crate::app::errors::ApiError;

/// Authenticated identity for a request.
///
/// Inserted by the session middleware; present on every authenticated route.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    session: Arc<Session>,
}

impl IdentityContext {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }
}

/// Resolved organization and role for a request.
///
/// Inserted by the route guard, only after the role was checked against the
/// route's permission metadata. Exempt routes never carry one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    principal: Principal,
}

impl OrganizationContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.principal.organization_id
    }
}

/// Extractor for the caller's identity.
pub struct CurrentUser(pub IdentityContext);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Authz(AuthzError::Unauthenticated))
    }
}

/// Extractor for the guarded organization scope.
pub struct CurrentOrganization(pub OrganizationContext);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentOrganization {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrganizationContext>()
            .copied()
            .map(CurrentOrganization)
            .ok_or(ApiError::Authz(AuthzError::MissingOrganization))
    }
}
