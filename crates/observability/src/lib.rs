//! Tracing/logging setup shared by native HR portal binaries.

/// Initialize process-wide logging with the format taken from
/// `HRPORTAL_LOG_FORMAT` (`json` by default).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;
