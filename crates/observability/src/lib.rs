//! Tracing/logging setup shared by the service and the CLI.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogFormatError, init_with};
