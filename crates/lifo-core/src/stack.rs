//! Public stack facade, generic over the storage backend.
//!
//! The backend is chosen at construction and fixed for the lifetime of
//! the instance. Both backends expose identical semantics; callers that
//! don't care default to the non-blocking one.
//!
//! # Teardown
//!
//! Dropping a `Stack` frees every remaining node, but concurrent use
//! during drop is undefined by construction (drop takes `&mut self`).
//! The intended shutdown order is: stop all users, [`drain`] if the
//! leftover values matter, then drop.
//!
//! [`drain`]: Stack::drain

use std::fmt;

use crate::backend::{Backend, BackendKind, Consistency};
use crate::error::StackError;
use crate::lock::LockBackend;
use crate::treiber::TreiberBackend;

/// Concurrent LIFO stack of `i64` values.
pub struct Stack<B: Backend = TreiberBackend> {
    backend: B,
}

/// Stack backed by a mutex-protected chain.
pub type LockStack = Stack<LockBackend>;

/// Stack backed by the lock-free Treiber algorithm.
pub type TreiberStack = Stack<TreiberBackend>;

impl<B: Backend> Stack<B> {
    /// Creates an empty stack.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Resource`] if the backend cannot set up
    /// its resources.
    pub fn new() -> Result<Self, StackError> {
        Ok(Self { backend: B::init()? })
    }

    /// Wraps an already-initialized backend.
    pub fn from_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Which backend this instance runs on.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        B::KIND
    }

    /// Pushes `value` onto the top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Allocation`] if the node cannot be
    /// allocated, [`StackError::Resource`] if the backend is unusable.
    /// The stack is unchanged on error.
    pub fn push(&self, value: i64) -> Result<(), StackError> {
        self.backend.push(value)
    }

    /// Removes and returns the top value.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Empty`] if the stack holds no values at
    /// the moment the operation takes effect. Empty is a normal
    /// outcome under concurrency, not a failure of the stack.
    pub fn pop(&self) -> Result<i64, StackError> {
        self.backend.pop()
    }

    /// Number of values currently stored.
    ///
    /// Instantaneous and advisory under concurrency.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Whether the stack is empty right now.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Values from top to bottom, as one consistent observation of the
    /// chain. Concurrent pushes and pops may land before or after the
    /// observed instant.
    #[must_use]
    pub fn snapshot(&self) -> Vec<i64> {
        self.backend.snapshot()
    }

    /// Renders the stack contents top-to-bottom for diagnostics.
    #[must_use]
    pub fn render(&self) -> String {
        let values = self.snapshot();
        if values.is_empty() {
            return format!("stack<{}> (empty)", self.kind());
        }
        let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        format!(
            "stack<{}> depth={} top -> {}",
            self.kind(),
            values.len(),
            items.join(" -> ")
        )
    }

    /// Structural self-check. `true` when the chain is acyclic and the
    /// traversed node count matches the recorded size.
    ///
    /// Meaningful at quiescence; under concurrent mutation a transient
    /// count mismatch is expected and not an error.
    #[must_use]
    pub fn check(&self) -> bool {
        self.audit().is_consistent()
    }

    /// Structural self-check with the full report.
    #[must_use]
    pub fn audit(&self) -> Consistency {
        self.backend.audit()
    }

    /// Pops every value until the stack reports empty, returning them
    /// in pop order (top first).
    ///
    /// Intended for teardown after all other users have quiesced.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Resource`] if the backend fails mid-drain;
    /// values popped up to that point are lost to the caller.
    pub fn drain(&self) -> Result<Vec<i64>, StackError> {
        let mut drained = Vec::new();
        loop {
            match self.pop() {
                Ok(value) => drained.push(value),
                Err(StackError::Empty) => return Ok(drained),
                Err(e) => return Err(e),
            }
        }
    }
}

impl<B: Backend> fmt::Display for Stack<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
