//! Non-blocking backend: the classic Treiber stack.
//!
//! Push and pop are CAS loops over the head pointer. No blocking lock
//! is held at any point; the system-wide progress guarantee is
//! lock-freedom (some contender always wins, individual threads may
//! retry without bound).
//!
//! # Memory safety
//!
//! Reclamation is epoch-based, via crossbeam-epoch, and applied
//! uniformly: every operation runs under a pinned guard, and a popped
//! node is retired with `defer_destroy` rather than freed. The
//! collector frees it only after every thread pinned at retire time
//! has unpinned, which rules out use-after-free for concurrent pops
//! holding the old head, and with it the ABA case where a recycled
//! address fools a CAS.
//!
//! Traversal (snapshot, audit) leans on one structural fact: a node's
//! `next` is never written again once the node is reachable from head,
//! so any head observed under a pin leads a frozen chain.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};

use crate::alloc::try_box;
use crate::backend::{Backend, BackendKind, Consistency};
use crate::error::StackError;

/// Lock-free stack storage.
pub struct TreiberBackend {
    head: Atomic<Node>,
    /// Approximate size, adjusted after each successful CAS.
    len: AtomicUsize,
}

struct Node {
    value: i64,
    next: Atomic<Node>,
}

impl Backend for TreiberBackend {
    const KIND: BackendKind = BackendKind::NonBlocking;

    fn init() -> Result<Self, StackError> {
        Ok(Self {
            head: Atomic::null(),
            len: AtomicUsize::new(0),
        })
    }

    fn push(&self, value: i64) -> Result<(), StackError> {
        let boxed = try_box(Node {
            value,
            next: Atomic::null(),
        })?;
        let mut node: Owned<Node> = Owned::from(boxed);

        let guard = epoch::pin();
        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            node.next.store(head, Ordering::Relaxed);

            match self.head.compare_exchange(
                head,
                node,
                Ordering::Release,
                Ordering::Relaxed,
                &guard,
            ) {
                Ok(_) => {
                    self.len.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                Err(e) => {
                    // CAS failed, retry with the same node
                    node = e.new;
                }
            }
        }
    }

    fn pop(&self) -> Result<i64, StackError> {
        let guard = epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, &guard);

            if head.is_null() {
                return Err(StackError::Empty);
            }

            // Safety: head is non-null and protected by the epoch guard.
            let head_ref = unsafe { head.deref() };
            let value = head_ref.value;
            let next = head_ref.next.load(Ordering::Acquire, &guard);

            match self.head.compare_exchange(
                head,
                next,
                Ordering::Release,
                Ordering::Relaxed,
                &guard,
            ) {
                Ok(_) => {
                    self.len.fetch_sub(1, Ordering::Relaxed);
                    // Safety: the CAS unlinked this node; retire it so the
                    // collector frees it once no pinned thread can see it.
                    unsafe {
                        guard.defer_destroy(head);
                    }
                    return Ok(value);
                }
                Err(_) => continue,
            }
        }
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Vec<i64> {
        let guard = epoch::pin();
        let mut values = Vec::new();
        let mut current = self.head.load(Ordering::Acquire, &guard);

        while let Some(node) = unsafe { current.as_ref() } {
            values.push(node.value);
            current = node.next.load(Ordering::Acquire, &guard);
        }

        values
    }

    fn audit(&self) -> Consistency {
        let guard = epoch::pin();
        let head = self.head.load(Ordering::Acquire, &guard);

        let acyclic = chain_is_acyclic(head, &guard);
        let traversed = if acyclic {
            let mut count = 0usize;
            let mut current = head;
            while let Some(node) = unsafe { current.as_ref() } {
                count += 1;
                current = node.next.load(Ordering::Acquire, &guard);
            }
            count
        } else {
            // A cyclic chain has no meaningful node count.
            0
        };

        Consistency {
            acyclic,
            traversed,
            recorded: self.len.load(Ordering::Relaxed),
        }
    }
}

/// Floyd's tortoise-and-hare over the chain observed from `head`.
///
/// The guard keeps every visited node alive, and published `next`
/// links never change, so the walk is on a frozen chain.
fn chain_is_acyclic(head: Shared<'_, Node>, guard: &Guard) -> bool {
    let mut slow = head;
    let mut fast = head;

    loop {
        match unsafe { fast.as_ref() } {
            Some(node) => fast = node.next.load(Ordering::Acquire, guard),
            None => return true,
        }
        match unsafe { fast.as_ref() } {
            Some(node) => fast = node.next.load(Ordering::Acquire, guard),
            None => return true,
        }
        if let Some(node) = unsafe { slow.as_ref() } {
            slow = node.next.load(Ordering::Acquire, guard);
        }
        if slow == fast {
            return false;
        }
    }
}

impl Drop for TreiberBackend {
    fn drop(&mut self) {
        // Exclusive access: no pin needed, walk the chain and free
        // each node directly.
        unsafe {
            let guard = epoch::unprotected();
            let mut current = self.head.load(Ordering::Relaxed, guard);
            while !current.is_null() {
                let node = current.into_owned();
                current = node.next.load(Ordering::Relaxed, guard);
                drop(node);
            }
        }
    }
}
