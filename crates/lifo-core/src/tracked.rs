//! Recording wrapper for property verification.
//!
//! [`Tracked`] wraps a [`Stack`] and keeps multiset bookkeeping plus an
//! operation history that [`StackPropertyChecker`] can replay. The
//! recording lock is held across each inner operation, so the history
//! is a true serialization of everything that went through the
//! wrapper and the LIFO replay is exact rather than approximate.
//!
//! That same lock serializes the operations themselves: a tracked
//! stack exercises the backend's code paths, not its parallelism.
//! Race hunting belongs to the bare [`Stack`] under real threads, the
//! loom shadow, and the DST scheduler.
//!
//! [`StackPropertyChecker`]: lifo_verify::StackPropertyChecker

use std::collections::HashMap;
use std::sync::Mutex;

use lifo_verify::{StackHistory, StackProperties};

use crate::backend::Backend;
use crate::error::StackError;
use crate::stack::Stack;

const RECORDER_POISONED: &str = "recorder mutex poisoned";

/// Stack plus the bookkeeping needed to check its properties.
pub struct Tracked<B: Backend> {
    stack: Stack<B>,
    recorder: Mutex<Recorder>,
}

#[derive(Default)]
struct Recorder {
    pushed: HashMap<i64, u64>,
    popped: HashMap<i64, u64>,
    history: StackHistory,
}

impl<B: Backend> Tracked<B> {
    /// Creates an empty tracked stack.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Resource`] if the backend cannot set up
    /// its resources.
    pub fn new() -> Result<Self, StackError> {
        Ok(Self {
            stack: Stack::new()?,
            recorder: Mutex::new(Recorder::default()),
        })
    }

    /// The wrapped stack, for snapshot and audit access.
    #[must_use]
    pub fn stack(&self) -> &Stack<B> {
        &self.stack
    }

    /// Pushes `value` on behalf of `thread_id`, recording the outcome.
    ///
    /// A failed push leaves no trace: nothing reached the stack, so
    /// nothing enters the books.
    ///
    /// # Errors
    ///
    /// Propagates the inner push error; the recorder lock being
    /// poisoned surfaces as [`StackError::Resource`].
    pub fn push(&self, thread_id: u64, value: i64) -> Result<(), StackError> {
        let mut recorder = self
            .recorder
            .lock()
            .map_err(|_| StackError::Resource(RECORDER_POISONED))?;

        self.stack.push(value)?;
        *recorder.pushed.entry(value).or_insert(0) += 1;
        recorder.history.record_push(thread_id, value);
        Ok(())
    }

    /// Pops on behalf of `thread_id`, recording the outcome.
    ///
    /// Observing empty is recorded too: the replay checks that the
    /// model stack was genuinely empty at that point.
    ///
    /// # Errors
    ///
    /// Propagates the inner pop error; the recorder lock being
    /// poisoned surfaces as [`StackError::Resource`].
    pub fn pop(&self, thread_id: u64) -> Result<i64, StackError> {
        let mut recorder = self
            .recorder
            .lock()
            .map_err(|_| StackError::Resource(RECORDER_POISONED))?;

        match self.stack.pop() {
            Ok(value) => {
                *recorder.popped.entry(value).or_insert(0) += 1;
                recorder.history.record_pop(thread_id, Some(value));
                Ok(value)
            }
            Err(StackError::Empty) => {
                recorder.history.record_pop(thread_id, None);
                Err(StackError::Empty)
            }
            Err(e) => Err(e),
        }
    }

    /// Read access to the books; a poisoned lock still yields the
    /// records for post-mortem checking.
    fn recorder(&self) -> std::sync::MutexGuard<'_, Recorder> {
        match self.recorder.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<B: Backend> StackProperties for Tracked<B> {
    fn pushed_counts(&self) -> HashMap<i64, u64> {
        self.recorder().pushed.clone()
    }

    fn popped_counts(&self) -> HashMap<i64, u64> {
        self.recorder().popped.clone()
    }

    fn contents(&self) -> Vec<i64> {
        self.stack.snapshot()
    }

    fn history(&self) -> StackHistory {
        self.recorder().history.clone()
    }
}
