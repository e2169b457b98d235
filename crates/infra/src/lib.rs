//! Infrastructure layer: in-memory stores behind organization-scoped
//! abstractions, and the organization directory.

pub mod directory;
pub mod read_model;
pub mod records;

pub use directory::{InMemoryDirectory, Invitation, InvitationStatus, MemberRecord, Organization};
pub use read_model::{InMemoryOrganizationStore, OrganizationStore};
pub use records::{NewRecord, Record, RecordChanges, RecordRepository};
