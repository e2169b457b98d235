//! Session resolution contract.
//!
//! The API hands a bearer token to a [`SessionProvider`] and gets back the
//! caller's identity plus their organization memberships, or an error that is
//! always reported as an authentication failure.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Serialize;
use thiserror::Error;

use coachboard_core::{OrganizationId, UserId};

use crate::{Membership, SessionClaims, TokenValidationError, validate_claims};

/// Authenticated identity resolved once per request. Never mutated by the
/// access layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub active_organization_id: Option<OrganizationId>,
    pub memberships: Vec<Membership>,
}

impl Session {
    pub fn membership(&self, organization_id: OrganizationId) -> Option<Membership> {
        self.memberships
            .iter()
            .copied()
            .find(|m| m.organization_id == organization_id)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("membership lookup failed: {0}")]
    Lookup(String),
}

/// Resolves a bearer token into a [`Session`].
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, token: &str) -> Result<Session, SessionError>;
}

/// Source of a user's organization memberships (the identity/organization
/// store).
#[async_trait]
pub trait MembershipSource: Send + Sync {
    async fn memberships(&self, user_id: UserId) -> Result<Vec<Membership>, SessionError>;
}

#[async_trait]
impl<M> MembershipSource for Arc<M>
where
    M: MembershipSource + ?Sized,
{
    async fn memberships(&self, user_id: UserId) -> Result<Vec<Membership>, SessionError> {
        (**self).memberships(user_id).await
    }
}

/// HS256 bearer-token session provider.
///
/// Verifies the signature, checks the claims' time window, then looks up the
/// user's memberships.
pub struct JwtSessionProvider {
    key: DecodingKey,
    validation: Validation,
    memberships: Arc<dyn MembershipSource>,
}

impl JwtSessionProvider {
    pub fn new(secret: &[u8], memberships: Arc<dyn MembershipSource>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Timestamps live in `issued_at`/`expires_at` and are checked by
        // `validate_claims`, not by the registered `exp` claim.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            memberships,
        }
    }

    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(&self, token: &str) -> Result<Session, SessionError> {
        let claims = self.decode(token, Utc::now())?;
        let memberships = self.memberships.memberships(claims.sub).await?;

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
            active_organization_id: claims.active_organization_id,
            memberships,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::Role;

    struct FixedMemberships(Vec<Membership>);

    #[async_trait]
    impl MembershipSource for FixedMemberships {
        async fn memberships(&self, _user_id: UserId) -> Result<Vec<Membership>, SessionError> {
            Ok(self.0.clone())
        }
    }

    fn mint(secret: &str, claims: &SessionClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(expires_in: Duration) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: UserId::new(),
            email: "coach@example.com".to_string(),
            active_organization_id: None,
            issued_at: now - Duration::seconds(5),
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn resolves_session_with_memberships() {
        let membership = Membership {
            organization_id: OrganizationId::new(),
            role: Role::Admin,
        };
        let provider =
            JwtSessionProvider::new(b"secret", Arc::new(FixedMemberships(vec![membership])));
        let claims = claims(Duration::minutes(5));

        let session = provider.get_session(&mint("secret", &claims)).await.unwrap();
        assert_eq!(session.user_id, claims.sub);
        assert_eq!(session.memberships, vec![membership]);
        assert_eq!(session.membership(membership.organization_id), Some(membership));
    }

    #[tokio::test]
    async fn rejects_wrong_signature_and_expired_tokens() {
        let provider = JwtSessionProvider::new(b"secret", Arc::new(FixedMemberships(vec![])));

        let forged = mint("other-secret", &claims(Duration::minutes(5)));
        assert!(matches!(
            provider.get_session(&forged).await,
            Err(SessionError::InvalidToken(_))
        ));

        let expired = mint("secret", &claims(Duration::seconds(-1)));
        assert!(matches!(
            provider.get_session(&expired).await,
            Err(SessionError::Claims(TokenValidationError::Expired))
        ));

        assert!(provider.get_session("not-a-jwt").await.is_err());
    }
}
