//! Result type aliases

use crate::error::DtError;

/// Standard Result type for scheduler operations
pub type DtResult<T> = Result<T, DtError>;

/// Logging helpers for results crossing a service boundary
pub trait ResultExt<T> {
    /// Log infrastructure failures with full context before they are
    /// surfaced as opaque errors
    fn log_internal(self, operation: &'static str) -> DtResult<T>;
}

impl<T> ResultExt<T> for DtResult<T> {
    fn log_internal(self, operation: &'static str) -> DtResult<T> {
        if let Err(err) = &self {
            if err.is_internal() {
                tracing::error!(operation, error = %err, "Storage or infrastructure failure");
            }
        }
        self
    }
}
