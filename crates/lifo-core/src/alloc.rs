//! Fallible node allocation.
//!
//! `Box::new` aborts the process when the allocator fails, but push is
//! contractually allowed to fail with `StackError::Allocation` and leave
//! the stack untouched. Node allocation therefore goes through
//! `std::alloc` with an explicit null check.

use std::alloc::{alloc, Layout};

use crate::error::StackError;

/// Heap-allocate `value`, reporting failure instead of aborting.
pub(crate) fn try_box<T>(value: T) -> Result<Box<T>, StackError> {
    let layout = Layout::new::<T>();
    debug_assert!(layout.size() > 0, "nodes are never zero-sized");

    // Safety: layout has non-zero size.
    let ptr = unsafe { alloc(layout) }.cast::<T>();
    if ptr.is_null() {
        return Err(StackError::Allocation);
    }

    // Safety: ptr is non-null, aligned for T, and uniquely owned here.
    unsafe {
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_box_round_trip() {
        let boxed = try_box(-42_i64).unwrap();
        assert_eq!(*boxed, -42);
    }

    #[test]
    fn test_try_box_runs_destructors() {
        // The boxed value must be dropped exactly once.
        let boxed = try_box(vec![1_i64, 2, 3]).unwrap();
        assert_eq!(boxed.len(), 3);
        drop(boxed);
    }
}
