//! Organization scoping: pick the organization a request acts within.

use coachboard_core::OrganizationId;

use crate::{AuthzError, Membership, Session};

/// Resolve the active organization (and the caller's role in it).
///
/// Selection order:
/// 1. an explicit per-request selection (e.g. a header),
/// 2. the session's stored active organization,
/// 3. the only membership, when the caller belongs to exactly one.
///
/// A selection the caller is not a member of, zero memberships, or several
/// memberships with nothing selected all fail with
/// [`AuthzError::MissingOrganization`].
pub fn resolve_organization(
    session: &Session,
    requested: Option<OrganizationId>,
) -> Result<Membership, AuthzError> {
    match requested.or(session.active_organization_id) {
        Some(organization_id) => session
            .membership(organization_id)
            .ok_or(AuthzError::MissingOrganization),
        None => match session.memberships.as_slice() {
            [only] => Ok(*only),
            _ => Err(AuthzError::MissingOrganization),
        },
    }
}
