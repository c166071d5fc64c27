//! Stack error types.

use thiserror::Error;

/// Errors surfaced by stack operations.
///
/// `Empty` and `Allocation` are recoverable: the caller may retry or
/// move on. `Resource` means the backend state is unusable and the
/// stack instance should be discarded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// A pop observed an empty stack.
    #[error("stack is empty")]
    Empty,

    /// Node allocation failed; the operation had no effect.
    #[error("node allocation failed")]
    Allocation,

    /// Backend state is unusable (construction failed or a lock was
    /// poisoned). Fatal to this stack instance.
    #[error("backend resources unusable: {0}")]
    Resource(&'static str),
}
