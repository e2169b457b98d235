//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: in-memory directory, records and access control
//! - `routes/`: the declarative route table and its handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: the single error-to-response mapping

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn_with_state, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use coachboard_auth::{JwtSessionProvider, MembershipSource};

use crate::config::ApiConfig;
use crate::middleware::{AuthState, session_middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Fails when the route table carries invalid permission metadata.
pub fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services()?);

    let memberships: Arc<dyn MembershipSource> = services.directory.clone();
    let sessions = Arc::new(JwtSessionProvider::new(config.jwt_secret.as_bytes(), memberships));
    let auth_state = AuthState { sessions };

    // Authenticated routes: session first, then each route's own guard.
    let protected = routes::router(
        routes::table(),
        services.access.clone(),
        &config.organization_header,
    )?
    .layer(Extension(services))
    .layer(from_fn_with_state(auth_state, session_middleware));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .fallback(errors::not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http())))
}
