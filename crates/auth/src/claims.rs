use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use coachboard_core::{OrganizationId, UserId};

/// Session token claims (transport-agnostic).
///
/// Memberships are deliberately not carried in the token: they are looked up
/// per request so role changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Verified email of the user (matched against invitations).
    pub email: String,

    /// Organization the user last selected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_organization_id: Option<OrganizationId>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claims' time window.
///
/// Signature verification happens before this, in the session provider.
pub fn validate_claims(
    claims: &SessionClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: UserId::new(),
            email: "coach@example.com".to_string(),
            active_organization_id: None,
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn validates_time_window() {
        let now = Utc::now();

        let ok = claims(now - Duration::minutes(1), now + Duration::minutes(5));
        assert_eq!(validate_claims(&ok, now), Ok(()));

        let expired = claims(now - Duration::minutes(10), now - Duration::minutes(1));
        assert_eq!(validate_claims(&expired, now), Err(TokenValidationError::Expired));

        let future = claims(now + Duration::minutes(1), now + Duration::minutes(5));
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = claims(now, now - Duration::minutes(1));
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn active_organization_is_optional_on_the_wire() {
        let now = Utc::now();
        let c = claims(now, now + Duration::minutes(1));
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("active_organization_id").is_none());

        let back: SessionClaims = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
