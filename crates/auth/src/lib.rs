//! `coachboard-auth`: pure authentication/authorization boundary.
//!
//! Everything here is decoupled from HTTP and storage: the API layer feeds
//! bearer tokens and route metadata in, and gets decisions out.

pub mod access_control;
pub mod authorize;
pub mod claims;
pub mod guard;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod scoping;
pub mod session;
pub mod statements;

pub use access_control::AccessControl;
pub use authorize::{AuthorizationExplanation, AuthzError, explain_authorization};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use guard::{GuardDecision, OrganizationScope, PermissionGuard, RouteMetadata};
pub use permissions::{Action, ActionSet, Permission, Resource};
pub use principal::{Membership, Principal};
pub use roles::{Role, RoleDefinitions};
pub use scoping::resolve_organization;
pub use session::{JwtSessionProvider, MembershipSource, Session, SessionError, SessionProvider};
pub use statements::{RegistryError, StatementRegistry, StatementSet};
