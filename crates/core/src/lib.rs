//! `coachboard-core`: shared domain primitives (ids and errors).
//!
//! This crate carries no infrastructure or transport concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{InvitationId, OrganizationId, RecordId, UserId};
