use std::sync::Arc;

use coachboard_auth::{AccessControl, RegistryError};
use coachboard_infra::{InMemoryDirectory, RecordRepository};

/// Shared application services, handed to handlers as an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub access: Arc<AccessControl>,
    pub directory: Arc<InMemoryDirectory>,
    pub records: RecordRepository,
}

/// Wire in-memory services around the standard access-control configuration.
pub fn build_services() -> Result<AppServices, RegistryError> {
    Ok(AppServices {
        access: Arc::new(AccessControl::standard()?),
        directory: Arc::new(InMemoryDirectory::new()),
        records: RecordRepository::in_memory(),
    })
}
