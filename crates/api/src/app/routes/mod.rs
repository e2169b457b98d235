//! Declarative route table.
//!
//! Every route is declared together with its permission metadata. The table
//! is validated as a whole before the router is built, so a route without
//! usable metadata stops startup instead of failing per request.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{
    Extension, Router,
    handler::Handler,
    http::{HeaderName, Method},
    middleware::from_fn_with_state,
    routing::{MethodFilter, MethodRouter, on},
};

use coachboard_auth::{AccessControl, AuthzError, RouteMetadata};

use crate::authz::{RouteGuard, enforce_route};

pub mod access;
pub mod members;
pub mod organizations;
pub mod records;
pub mod system;

pub struct RouteDeclaration {
    pub method: Method,
    pub path: String,
    pub metadata: RouteMetadata,
    handler: MethodRouter,
}

macro_rules! method_constructor {
    ($name:ident, $method:ident) => {
        pub fn $name<H, T>(path: impl Into<String>, metadata: RouteMetadata, handler: H) -> Self
        where
            H: Handler<T, ()>,
            T: 'static,
        {
            Self {
                method: Method::$method,
                path: path.into(),
                metadata,
                handler: on(MethodFilter::$method, handler),
            }
        }
    };
}

impl RouteDeclaration {
    method_constructor!(get, GET);
    method_constructor!(post, POST);
    method_constructor!(put, PUT);
    method_constructor!(patch, PATCH);
    method_constructor!(delete, DELETE);

    /// Attach a request extension visible only to this route's handler.
    pub fn with_extension<E>(mut self, value: E) -> Self
    where
        E: Clone + Send + Sync + 'static,
    {
        self.handler = self.handler.layer(Extension(value));
        self
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Every authenticated route the API serves.
pub fn table() -> Vec<RouteDeclaration> {
    let mut routes = Vec::new();
    routes.extend(system::routes());
    routes.extend(organizations::routes());
    routes.extend(records::routes());
    routes.extend(members::routes());
    routes.extend(access::routes());
    routes
}

/// Validate the table and build a router with each route behind its guard.
pub fn router(
    routes: Vec<RouteDeclaration>,
    access: Arc<AccessControl>,
    organization_header: &HeaderName,
) -> Result<Router, AuthzError> {
    let mut seen = HashSet::new();
    let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();

    for route in routes {
        let name = route.name();
        route.metadata.validate(&name)?;
        if !seen.insert(name.clone()) {
            return Err(AuthzError::RouteMetadata {
                route: name,
                reason: "route declared more than once",
            });
        }

        let guard = RouteGuard {
            access: access.clone(),
            metadata: route.metadata,
            route: Arc::from(name.as_str()),
            organization_header: organization_header.clone(),
        };
        let handler = route
            .handler
            .route_layer(from_fn_with_state(guard, enforce_route));

        let merged = match by_path.remove(&route.path) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        by_path.insert(route.path, merged);
    }

    Ok(by_path
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| router.route(&path, handler)))
}
