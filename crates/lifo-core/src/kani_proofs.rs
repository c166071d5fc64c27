//! Kani proof harnesses for the stack facade.
//!
//! Bounded model checking over symbolic values: each harness verifies
//! a sequential property for every `i64` the bounds admit. Kani does
//! not execute real concurrency, so interleavings are covered by loom
//! (see `loom_shadow`) and the DST suite instead.
//!
//! # Running the proofs
//!
//! ```bash
//! # All proofs
//! cargo kani -p lifo-core
//!
//! # One harness
//! cargo kani -p lifo-core --harness proof_pop_returns_pushed_value
//!
//! # Higher unwind bound (more thorough, slower)
//! cargo kani -p lifo-core --default-unwind 20
//! ```

#[cfg(kani)]
mod proofs {
    use crate::error::StackError;
    use crate::stack::{LockStack, Stack, TreiberStack};

    /// A pushed value is present in the snapshot immediately after.
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_push_preserves_value() {
        let stack: TreiberStack = Stack::new().unwrap();

        let value: i64 = kani::any();

        stack.push(value).unwrap();

        let contents = stack.snapshot();
        kani::assert(
            contents.contains(&value),
            "pushed value must appear in the snapshot",
        );
    }

    /// Push then pop returns the same value, the full i64 range
    /// included (zero and negatives are ordinary payloads).
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_pop_returns_pushed_value() {
        let stack: TreiberStack = Stack::new().unwrap();

        let value: i64 = kani::any();

        stack.push(value).unwrap();
        let popped = stack.pop();

        kani::assert(
            popped == Ok(value),
            "pop must return the value that was just pushed",
        );
    }

    /// Push v1 then v2: pops return v2 first, then v1.
    #[kani::proof]
    #[kani::unwind(4)]
    fn proof_lifo_order() {
        let stack: TreiberStack = Stack::new().unwrap();

        let v1: i64 = kani::any();
        let v2: i64 = kani::any();
        kani::assume(v1 != v2);

        stack.push(v1).unwrap();
        stack.push(v2).unwrap();

        kani::assert(
            stack.pop() == Ok(v2),
            "second pushed value must pop first",
        );
        kani::assert(
            stack.pop() == Ok(v1),
            "first pushed value must pop second",
        );
    }

    /// Empty pop is the distinguishable Empty error, on both backends.
    #[kani::proof]
    fn proof_empty_pop_is_distinguishable() {
        let treiber: TreiberStack = Stack::new().unwrap();
        kani::assert(
            treiber.pop() == Err(StackError::Empty),
            "pop on an empty non-blocking stack must report Empty",
        );

        let lock: LockStack = Stack::new().unwrap();
        kani::assert(
            lock.pop() == Err(StackError::Empty),
            "pop on an empty lock-based stack must report Empty",
        );
    }

    /// is_empty follows push and pop.
    #[kani::proof]
    #[kani::unwind(3)]
    fn proof_is_empty_tracks_contents() {
        let stack: LockStack = Stack::new().unwrap();

        kani::assert(stack.is_empty(), "new stack must be empty");

        let value: i64 = kani::any();
        stack.push(value).unwrap();
        kani::assert(!stack.is_empty(), "stack holding a value is not empty");

        stack.pop().unwrap();
        kani::assert(stack.is_empty(), "stack must be empty again after pop");
    }

    /// Over any bounded op sequence, successful pops never outnumber
    /// pushes.
    #[kani::proof]
    #[kani::unwind(8)]
    fn proof_pop_count_bounded() {
        let stack: TreiberStack = Stack::new().unwrap();

        let mut pushed: u64 = 0;
        let mut popped: u64 = 0;

        for _ in 0..5u8 {
            let is_push: bool = kani::any();

            if is_push {
                stack.push(pushed as i64).unwrap();
                pushed += 1;
            } else if stack.pop().is_ok() {
                popped += 1;
            }
        }

        kani::assert(popped <= pushed, "cannot pop more values than pushed");
    }

    /// After n pushes the snapshot holds exactly n values.
    #[kani::proof]
    #[kani::unwind(6)]
    fn proof_len_after_pushes() {
        let stack: TreiberStack = Stack::new().unwrap();

        let n: u8 = kani::any();
        kani::assume(n <= 5);

        for i in 0..n {
            stack.push(i as i64).unwrap();
        }

        kani::assert(
            stack.snapshot().len() == n as usize,
            "snapshot length must equal the number of pushes",
        );
        kani::assert(
            stack.len() == n as usize,
            "recorded length must equal the number of pushes",
        );
    }
}

// Outside `cargo kani` the harnesses compile away.
#[cfg(not(kani))]
mod proofs {}
