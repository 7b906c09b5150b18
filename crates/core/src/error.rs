//! Bus error model.

use thiserror::Error;

/// Result type used for the fallible parts of the bus (configuration).
pub type BusResult<T> = Result<T, BusError>;

/// Bus-level error.
///
/// Subscribe, unsubscribe and publish never fail; unknown event types and
/// handles are no-ops. The only fallible surface is turning external input
/// (environment, config strings) into a bus configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// An unrecognised lock policy name.
    #[error("invalid lock policy: {0:?} (expected \"hold\" or \"snapshot\")")]
    InvalidLockPolicy(String),

    /// An unrecognised panic policy name.
    #[error("invalid panic policy: {0:?} (expected \"propagate\" or \"isolate\")")]
    InvalidPanicPolicy(String),
}

impl BusError {
    pub fn invalid_lock_policy(value: impl Into<String>) -> Self {
        Self::InvalidLockPolicy(value.into())
    }

    pub fn invalid_panic_policy(value: impl Into<String>) -> Self {
        Self::InvalidPanicPolicy(value.into())
    }
}
