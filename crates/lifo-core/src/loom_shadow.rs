//! Loom-checkable shadow of the Treiber backend.
//!
//! crossbeam-epoch's pinning is not instrumented by loom, so the real
//! [`TreiberBackend`](crate::treiber::TreiberBackend) cannot be model
//! checked directly. This module mirrors its CAS discipline with plain
//! atomics so loom can exhaust the interleavings of the algorithm
//! itself.
//!
//! # Usage
//!
//! Normal tests:
//! ```bash
//! cargo test -p lifo-core
//! ```
//!
//! Loom tests:
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test -p lifo-core --release
//! ```
//!
//! # Reclamation
//!
//! Popped nodes are leaked. A concurrent pop holding a stale head can
//! therefore never touch freed memory, and loom executions are bounded
//! so the leak is acceptable. The production backend retires nodes
//! through the epoch collector instead; allocation failure is likewise
//! not modeled here.

#[cfg(loom)]
use loom::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use std::ptr;

use crate::error::StackError;

/// Treiber stack over raw pointers, reclamation replaced by leaking.
pub struct ShadowStack {
    head: AtomicPtr<Node>,
    len: AtomicUsize,
}

struct Node {
    value: i64,
    next: *mut Node,
}

impl ShadowStack {
    /// Creates an empty shadow stack.
    pub fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
            len: AtomicUsize::new(0),
        }
    }

    /// Pushes `value`, retrying the head CAS until it lands.
    pub fn push(&self, value: i64) {
        let node = Box::into_raw(Box::new(Node {
            value,
            next: ptr::null_mut(),
        }));

        loop {
            let head = self.head.load(Ordering::Acquire);

            // Safety: node is unpublished, this thread owns it.
            unsafe {
                (*node).next = head;
            }

            match self
                .head
                .compare_exchange(head, node, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => {
                    self.len.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(_) => {
                    #[cfg(loom)]
                    loom::thread::yield_now();
                    continue;
                }
            }
        }
    }

    /// Pops the top value.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Empty`] when the head is null at the
    /// winning CAS attempt.
    pub fn pop(&self) -> Result<i64, StackError> {
        loop {
            let head = self.head.load(Ordering::Acquire);

            if head.is_null() {
                return Err(StackError::Empty);
            }

            // Safety: nodes are never freed, so head stays readable
            // even if another pop unlinks it first.
            let next = unsafe { (*head).next };

            match self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => {
                    self.len.fetch_sub(1, Ordering::Relaxed);
                    // Safety: the CAS granted exclusive ownership of head.
                    let value = unsafe { (*head).value };
                    // Leak the node, see the module doc.
                    return Ok(value);
                }
                Err(_) => {
                    #[cfg(loom)]
                    loom::thread::yield_now();
                    continue;
                }
            }
        }
    }

    /// Whether the stack is empty right now.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }

    /// Approximate size.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

impl Default for ShadowStack {
    fn default() -> Self {
        Self::new()
    }
}


/// Exhaustive interleaving checks, run with `--cfg loom`.
#[cfg(loom)]
mod loom_tests {
    use super::*;
    use loom::sync::Arc;
    use loom::thread;

    #[test]
    fn test_racing_pushes_both_land() {
        loom::model(|| {
            let stack = Arc::new(ShadowStack::new());

            let s1 = Arc::clone(&stack);
            let s2 = Arc::clone(&stack);

            let h1 = thread::spawn(move || s1.push(1));
            let h2 = thread::spawn(move || s2.push(2));

            h1.join().unwrap();
            h2.join().unwrap();

            let mut values = vec![];
            while let Ok(v) = stack.pop() {
                values.push(v);
            }
            values.sort();
            assert_eq!(values, vec![1, 2]);
        });
    }

    #[test]
    fn test_racing_push_and_pop() {
        loom::model(|| {
            let stack = Arc::new(ShadowStack::new());
            stack.push(1);

            let s1 = Arc::clone(&stack);
            let s2 = Arc::clone(&stack);

            let h1 = thread::spawn(move || s1.push(2));
            let h2 = thread::spawn(move || s2.pop());

            h1.join().unwrap();
            let popped = h2.join().unwrap();

            // One value was present before the race, so the pop can
            // never observe empty.
            assert!(popped.is_ok());

            let mut remaining = 0;
            while stack.pop().is_ok() {
                remaining += 1;
            }
            assert_eq!(remaining + 1, 2);
        });
    }

    #[test]
    fn test_racing_pops_one_winner() {
        loom::model(|| {
            let stack = Arc::new(ShadowStack::new());
            stack.push(1);

            let s1 = Arc::clone(&stack);
            let s2 = Arc::clone(&stack);

            let h1 = thread::spawn(move || s1.pop());
            let h2 = thread::spawn(move || s2.pop());

            let r1 = h1.join().unwrap();
            let r2 = h2.join().unwrap();

            match (r1, r2) {
                (Ok(1), Err(StackError::Empty)) => {}
                (Err(StackError::Empty), Ok(1)) => {}
                other => panic!("unexpected outcome: {:?}", other),
            }
        });
    }

    #[test]
    fn test_no_lost_values() {
        loom::model(|| {
            let stack = Arc::new(ShadowStack::new());

            let s1 = Arc::clone(&stack);
            let s2 = Arc::clone(&stack);

            let h1 = thread::spawn(move || {
                s1.push(1);
                s1.push(2);
            });
            let h2 = thread::spawn(move || {
                s2.push(3);
                s2.push(4);
            });

            h1.join().unwrap();
            h2.join().unwrap();

            let mut values = vec![];
            while let Ok(v) = stack.pop() {
                values.push(v);
            }
            values.sort();
            assert_eq!(values, vec![1, 2, 3, 4], "lost values");
        });
    }
}
