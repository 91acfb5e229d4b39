//! Error types for memoization usage failures
//!
//! Provides unified error handling using thiserror. Failures of the wrapped
//! operation are never converted into this type: callers get their own error
//! back from [`Memoized::call`](crate::Memoized::call).

use thiserror::Error;

// == Memo Error Enum ==
/// Usage errors raised by the memoization layer itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoError {
    /// The clear target was never bound to a memoized function
    #[error("Cannot clear: handle is not bound to a memoized function")]
    NotMemoized,

    /// The bound cache store has no bulk-clear capability
    #[error("Cannot clear: the cache store does not support clear()")]
    ClearUnsupported,
}

// == Result Type Alias ==
/// Convenience Result type for memoization usage failures.
pub type Result<T> = std::result::Result<T, MemoError>;
