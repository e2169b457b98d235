//! Tracing and logging setup shared by binaries and tests.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
