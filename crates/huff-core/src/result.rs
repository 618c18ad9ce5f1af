//! Result type alias for HUFF pipeline operations

use crate::error::HuffError;

/// Standard Result type for HUFF pipeline operations
pub type Result<T> = std::result::Result<T, HuffError>;

/// Extension trait for Result to provide degrade-and-log helpers
pub trait ResultExt<T> {
    /// Log the error and continue with None
    fn log_and_continue(self) -> Option<T>;

    /// Log the error and fall back to the type's default value
    fn or_default_logged(self, what: &str) -> T
    where
        T: Default;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!("Continuing after error: {}", err);
                } else {
                    tracing::error!("Fatal error: {}", err);
                }
                None
            }
        }
    }

    fn or_default_logged(self, what: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Falling back to default {}: {}", what, err);
                T::default()
            }
        }
    }
}
