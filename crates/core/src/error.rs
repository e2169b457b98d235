//! Errors shared by the directory and record stores.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (names, emails, slugs, statuses).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The change would leave the organization in an invalid state, such as
    /// removing its last owner.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Nothing of this kind exists within the caller's organization.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor tried to grant, change or remove a role above their own.
    #[error("cannot act on a role above your own")]
    RoleEscalation,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Lazy constructor for `Option::ok_or_else`.
    pub fn not_found(kind: &'static str) -> impl FnOnce() -> Self {
        move || Self::NotFound(kind)
    }
}
