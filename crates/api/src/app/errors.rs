//! Central error mapping: every failure leaves the API as `{ "message": ... }`
//! with a status derived from its variant.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use coachboard_auth::AuthzError;
use coachboard_core::DomainError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    RouteNotFound,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authz(AuthzError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Authz(AuthzError::MissingOrganization | AuthzError::Forbidden(_)) => {
                StatusCode::FORBIDDEN
            }
            ApiError::Authz(AuthzError::RouteMetadata { .. }) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Domain(DomainError::Validation(_) | DomainError::InvalidId(_))
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::NotFound(_)) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Domain(DomainError::InvariantViolation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Domain(DomainError::RoleEscalation) => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Configuration errors are logged, not exposed.
    fn message(&self) -> String {
        match self {
            ApiError::Authz(AuthzError::RouteMetadata { .. }) => ApiError::Internal.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Authz(AuthzError::RouteMetadata { route, reason }) = &self {
            tracing::error!(%route, %reason, "route permission metadata error");
        }
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor whose rejection uses the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection uses the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(ApiError::Domain)
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
