//! Property-based tests over both backends.
//!
//! Sequential properties only: proptest drives one thread through
//! arbitrary operation sequences and compares against a `Vec` model.
//! Disabled under Miri (too slow for interpretation).
#![cfg(not(miri))]

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use lifo_core::{Backend, LockBackend, Stack, StackError, TreiberBackend};

fn check_lifo_roundtrip<B: Backend>(values: &[i64]) -> Result<(), TestCaseError> {
    let stack: Stack<B> = Stack::new().unwrap();
    for &value in values {
        stack.push(value).unwrap();
    }

    let mut popped = Vec::new();
    while let Ok(value) = stack.pop() {
        popped.push(value);
    }

    let expected: Vec<i64> = values.iter().rev().copied().collect();
    prop_assert_eq!(popped, expected);
    prop_assert_eq!(stack.pop(), Err(StackError::Empty));
    Ok(())
}

fn check_against_model<B: Backend>(ops: &[(bool, i64)]) -> Result<(), TestCaseError> {
    let stack: Stack<B> = Stack::new().unwrap();
    let mut model: Vec<i64> = Vec::new();

    for &(is_push, value) in ops {
        if is_push {
            stack.push(value).unwrap();
            model.push(value);
        } else {
            match (stack.pop(), model.pop()) {
                (Ok(got), Some(expected)) => prop_assert_eq!(got, expected),
                (Err(StackError::Empty), None) => {}
                (got, expected) => {
                    return Err(TestCaseError::fail(format!(
                        "pop diverged from model: got {:?}, model had {:?}",
                        got, expected
                    )));
                }
            }
        }

        prop_assert_eq!(stack.len(), model.len());
        prop_assert_eq!(stack.is_empty(), model.is_empty());
    }

    let mut snapshot = stack.snapshot();
    snapshot.reverse();
    prop_assert_eq!(snapshot, model);
    prop_assert!(stack.check());
    Ok(())
}

fn check_drain_equals_model<B: Backend>(values: &[i64]) -> Result<(), TestCaseError> {
    let stack: Stack<B> = Stack::new().unwrap();
    for &value in values {
        stack.push(value).unwrap();
    }

    let drained = stack.drain().unwrap();
    let expected: Vec<i64> = values.iter().rev().copied().collect();
    prop_assert_eq!(drained, expected);
    prop_assert!(stack.is_empty());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_lifo_roundtrip(
        values in prop::collection::vec(-10_000i64..10_000, 1..200)
    ) {
        check_lifo_roundtrip::<LockBackend>(&values)?;
        check_lifo_roundtrip::<TreiberBackend>(&values)?;
    }

    #[test]
    fn prop_duplicates_conserved(
        // A tight value range forces duplicates
        values in prop::collection::vec(-3i64..3, 1..300)
    ) {
        check_lifo_roundtrip::<LockBackend>(&values)?;
        check_lifo_roundtrip::<TreiberBackend>(&values)?;
    }

    #[test]
    fn prop_matches_sequential_model(
        ops in prop::collection::vec((prop::bool::ANY, -100i64..100), 1..200)
    ) {
        check_against_model::<LockBackend>(&ops)?;
        check_against_model::<TreiberBackend>(&ops)?;
    }

    #[test]
    fn prop_drain_pops_everything_in_order(
        values in prop::collection::vec(any::<i64>(), 0..100)
    ) {
        check_drain_equals_model::<LockBackend>(&values)?;
        check_drain_equals_model::<TreiberBackend>(&values)?;
    }
}
