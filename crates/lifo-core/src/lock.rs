//! Lock-based backend: one mutex around a singly linked chain.
//!
//! Correctness follows directly from mutual exclusion: at most one
//! mutator touches the chain at a time, so linearizability and
//! acyclicity are immediate. The chain is acyclic by construction
//! anyway, since every node owns its successor.

use std::sync::{Mutex, MutexGuard};

use crate::alloc::try_box;
use crate::backend::{Backend, BackendKind, Consistency};
use crate::error::StackError;

const POISONED: &str = "stack mutex poisoned";

/// Stack storage gated by a single mutex.
pub struct LockBackend {
    chain: Mutex<Chain>,
}

struct Chain {
    head: Option<Box<Node>>,
    len: usize,
}

struct Node {
    value: i64,
    next: Option<Box<Node>>,
}

impl Backend for LockBackend {
    const KIND: BackendKind = BackendKind::LockBased;

    fn init() -> Result<Self, StackError> {
        Ok(Self {
            chain: Mutex::new(Chain { head: None, len: 0 }),
        })
    }

    fn push(&self, value: i64) -> Result<(), StackError> {
        // Allocate before taking the lock: the allocation-failure path
        // must not hold the mutex, and the critical section stays short.
        let mut node = try_box(Node { value, next: None })?;

        let mut chain = self
            .chain
            .lock()
            .map_err(|_| StackError::Resource(POISONED))?;
        node.next = chain.head.take();
        chain.head = Some(node);
        chain.len += 1;
        Ok(())
    }

    fn pop(&self) -> Result<i64, StackError> {
        let mut chain = self
            .chain
            .lock()
            .map_err(|_| StackError::Resource(POISONED))?;
        match chain.head.take() {
            Some(node) => {
                let node = *node;
                chain.head = node.next;
                debug_assert!(chain.len > 0, "length counter out of sync");
                chain.len -= 1;
                Ok(node.value)
            }
            None => Err(StackError::Empty),
        }
    }

    fn len(&self) -> usize {
        self.lock_for_read().len
    }

    fn snapshot(&self) -> Vec<i64> {
        let chain = self.lock_for_read();
        let mut values = Vec::with_capacity(chain.len);
        let mut current = chain.head.as_deref();
        while let Some(node) = current {
            values.push(node.value);
            current = node.next.as_deref();
        }
        values
    }

    fn audit(&self) -> Consistency {
        let chain = self.lock_for_read();
        let mut traversed = 0usize;
        let mut current = chain.head.as_deref();
        while let Some(node) = current {
            traversed += 1;
            current = node.next.as_deref();
        }
        Consistency {
            acyclic: true,
            traversed,
            recorded: chain.len,
        }
    }
}

impl LockBackend {
    /// Diagnostics keep working on a poisoned mutex: the chain is still
    /// intact (mutations are all-or-nothing under the lock), and
    /// reporting must never fail.
    fn lock_for_read(&self) -> MutexGuard<'_, Chain> {
        match self.chain.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        // Iterative teardown: dropping a deep chain through the default
        // recursive path overflows the call stack.
        let mut current = self.head.take();
        while let Some(mut node) = current {
            current = node.next.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_pop_lifo() {
        let backend = LockBackend::init().unwrap();
        backend.push(1).unwrap();
        backend.push(2).unwrap();
        backend.push(3).unwrap();

        assert_eq!(backend.pop(), Ok(3));
        assert_eq!(backend.pop(), Ok(2));
        assert_eq!(backend.pop(), Ok(1));
        assert_eq!(backend.pop(), Err(StackError::Empty));
    }

    #[test]
    fn test_zero_and_negative_values() {
        let backend = LockBackend::init().unwrap();
        backend.push(0).unwrap();
        backend.push(-1).unwrap();
        backend.push(i64::MIN).unwrap();

        assert_eq!(backend.pop(), Ok(i64::MIN));
        assert_eq!(backend.pop(), Ok(-1));
        assert_eq!(backend.pop(), Ok(0));
    }

    #[test]
    fn test_snapshot_top_to_bottom() {
        let backend = LockBackend::init().unwrap();
        for value in [10, 20, 30] {
            backend.push(value).unwrap();
        }
        assert_eq!(backend.snapshot(), vec![30, 20, 10]);
        assert_eq!(backend.len(), 3);
    }

    #[test]
    fn test_audit_consistent() {
        let backend = LockBackend::init().unwrap();
        for value in 0..100 {
            backend.push(value).unwrap();
        }
        backend.pop().unwrap();

        let report = backend.audit();
        assert!(report.acyclic);
        assert_eq!(report.traversed, 99);
        assert_eq!(report.recorded, 99);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_deep_chain_drops_without_overflow() {
        let backend = LockBackend::init().unwrap();
        for value in 0..200_000 {
            backend.push(value).unwrap();
        }
        drop(backend);
    }

    #[test]
    fn test_poisoned_mutex_surfaces_resource_error() {
        let backend = Arc::new(LockBackend::init().unwrap());
        backend.push(7).unwrap();

        // Poison the mutex by panicking while holding it.
        let poisoner = Arc::clone(&backend);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.chain.lock().unwrap();
            panic!("poisoning the stack mutex");
        })
        .join();

        assert!(matches!(
            backend.push(8),
            Err(StackError::Resource(_))
        ));
        assert!(matches!(backend.pop(), Err(StackError::Resource(_))));

        // Diagnostics recover the guard and keep reporting.
        assert_eq!(backend.snapshot(), vec![7]);
        assert!(backend.audit().is_consistent());
    }
}
