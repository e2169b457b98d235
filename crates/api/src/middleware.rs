use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use coachboard_auth::{AuthzError, SessionError, SessionProvider};

use crate::app::errors::ApiError;
use crate::context::IdentityContext;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionProvider>,
}

/// Resolve the bearer token into a session, or reject with 401.
///
/// A failed membership lookup is also a 401: the session could not be
/// resolved, whatever the cause. It is logged at error level.
pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::Authz(AuthzError::Unauthenticated))?;

    let session = state.sessions.get_session(token).await.map_err(reject_session)?;

    req.extensions_mut().insert(IdentityContext::new(session));
    Ok(next.run(req).await)
}

fn reject_session(err: SessionError) -> ApiError {
    match &err {
        SessionError::Lookup(reason) => {
            tracing::error!(%reason, "session membership lookup failed")
        }
        _ => tracing::debug!(error = %err, "rejected bearer token"),
    }
    ApiError::Authz(AuthzError::Unauthenticated)
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn malformed_authorization_is_rejected() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer(&headers("Bearer   ")), None);
    }

    #[test]
    fn every_session_failure_is_unauthenticated() {
        for err in [
            SessionError::InvalidToken(jsonwebtoken::errors::ErrorKind::InvalidToken.into()),
            SessionError::Lookup("membership store unavailable".to_string()),
        ] {
            assert_eq!(reject_session(err).status(), StatusCode::UNAUTHORIZED);
        }
    }
}
