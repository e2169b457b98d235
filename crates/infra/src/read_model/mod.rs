//! Organization-isolated storage abstractions.

pub mod organization_store;

pub use organization_store::{InMemoryOrganizationStore, OrganizationStore};
