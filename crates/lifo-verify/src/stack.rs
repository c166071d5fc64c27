//! Stack invariant checking.
//!
//! Values are treated as multisets: the same integer may legally be
//! pushed any number of times, so conservation is counted per value
//! rather than tracked by unique element identity.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoLostValues | Every push is accounted for by a pop or by current contents |
//! | NoPhantomValues | Nothing is popped or retained that was never pushed |
//! | LifoOrder | The recorded history replays exactly against a sequential model |

use std::collections::HashMap;

use crate::counterexample::{Counterexample, StateSnapshot, ThreadAction};
use crate::property::{PropertyChecker, PropertyResult};

/// Properties any stack under verification must expose.
///
/// Implementations hand the checker owned copies of their bookkeeping.
/// Owned data avoids borrowing against internal mutexes.
pub trait StackProperties {
    /// How many times each value has been pushed.
    fn pushed_counts(&self) -> HashMap<i64, u64>;

    /// How many times each value has been popped.
    fn popped_counts(&self) -> HashMap<i64, u64>;

    /// Current contents of the stack (top to bottom).
    fn contents(&self) -> Vec<i64>;

    /// Operation history for LIFO order checking.
    fn history(&self) -> StackHistory;
}

/// History of stack operations in serialization order.
///
/// The replay in `LifoOrder` is exact only when the recorder serialized
/// the operations it observed (one recording lock held across each
/// operation). Histories stitched together after the fact do not have
/// that guarantee.
#[derive(Debug, Clone, Default)]
pub struct StackHistory {
    /// Sequence of operations in serialization order
    pub operations: Vec<StackOperation>,
}

/// A single stack operation.
#[derive(Debug, Clone)]
pub struct StackOperation {
    /// Thread that performed the operation
    pub thread_id: u64,
    /// Type of operation
    pub op_type: StackOpType,
    /// Value involved (Some for push, the result for pop)
    pub value: Option<i64>,
    /// Step number for ordering
    pub step: u64,
}

/// Type of stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOpType {
    Push,
    Pop,
    PopEmpty,
}

impl StackHistory {
    /// Create a new empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Record a push operation. Steps are assigned in recording order.
    pub fn record_push(&mut self, thread_id: u64, value: i64) {
        let step = self.operations.len() as u64 + 1;
        self.operations.push(StackOperation {
            thread_id,
            op_type: StackOpType::Push,
            value: Some(value),
            step,
        });
    }

    /// Record a pop operation; `None` records a pop that found the stack empty.
    pub fn record_pop(&mut self, thread_id: u64, value: Option<i64>) {
        let step = self.operations.len() as u64 + 1;
        self.operations.push(StackOperation {
            thread_id,
            op_type: if value.is_some() {
                StackOpType::Pop
            } else {
                StackOpType::PopEmpty
            },
            value,
            step,
        });
    }
}

/// Property checker for stack bookkeeping.
pub struct StackPropertyChecker<'a, T: StackProperties> {
    stack: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: StackProperties> StackPropertyChecker<'a, T> {
    /// Create a new checker for the given stack.
    #[must_use]
    pub fn new(stack: &'a T) -> Self {
        Self {
            stack,
            dst_seed: None,
        }
    }

    /// Set a DST seed for counterexample reproduction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        self.dst_seed = Some(seed);
        self
    }

    fn counterexample(&self) -> Counterexample {
        match self.dst_seed {
            Some(seed) => Counterexample::with_seed(seed),
            None => Counterexample::new(),
        }
    }

    /// NoLostValues
    ///
    /// Every value that was pushed must either still be in the stack
    /// or have been popped. No value can be lost.
    fn check_no_lost_values(&self) -> PropertyResult {
        let pushed = self.stack.pushed_counts();
        let popped = self.stack.popped_counts();
        let present = value_counts(&self.stack.contents());

        for (value, &pushed_count) in &pushed {
            let popped_count = popped.get(value).copied().unwrap_or(0);
            let present_count = present.get(value).copied().unwrap_or(0);
            let accounted = popped_count + present_count;

            if accounted < pushed_count {
                let mut ce = self.counterexample();
                ce.add_state(StateSnapshot {
                    step: 1,
                    description: format!("value {} lost", value),
                    variables: vec![
                        ("pushed".to_string(), pushed_count.to_string()),
                        ("popped".to_string(), popped_count.to_string()),
                        ("present".to_string(), present_count.to_string()),
                    ],
                });

                return PropertyResult::fail(
                    "NoLostValues",
                    format!(
                        "value {} pushed {} times but only {} accounted for ({} popped, {} present)",
                        value, pushed_count, accounted, popped_count, present_count
                    ),
                    Some(ce),
                );
            }
        }

        PropertyResult::pass("NoLostValues")
    }

    /// NoPhantomValues
    ///
    /// Nothing may be popped, or sit in the stack, more times than it
    /// was pushed. A phantom indicates a duplicated node or a pop that
    /// returned fabricated data.
    fn check_no_phantom_values(&self) -> PropertyResult {
        let pushed = self.stack.pushed_counts();
        let popped = self.stack.popped_counts();

        let mut observed = value_counts(&self.stack.contents());
        for (value, count) in popped {
            *observed.entry(value).or_insert(0) += count;
        }

        for (value, observed_count) in observed {
            let pushed_count = pushed.get(&value).copied().unwrap_or(0);
            if observed_count > pushed_count {
                return PropertyResult::fail(
                    "NoPhantomValues",
                    format!(
                        "value {} observed {} times (popped + present) but pushed only {} times",
                        value, observed_count, pushed_count
                    ),
                    None,
                );
            }
        }

        PropertyResult::pass("NoPhantomValues")
    }

    /// LifoOrder
    ///
    /// Replays the operation history against a model stack and checks
    /// that every pop result matches the model. A pop that observed
    /// empty must coincide with an empty model.
    fn check_lifo_order(&self) -> PropertyResult {
        let history = self.stack.history();

        // An unused stack trivially satisfies LIFO.
        if history.operations.is_empty() {
            return PropertyResult::pass("LifoOrder");
        }

        let mut model: Vec<i64> = Vec::new();

        for op in &history.operations {
            match op.op_type {
                StackOpType::Push => {
                    if let Some(value) = op.value {
                        model.push(value);
                    }
                }
                StackOpType::Pop => {
                    if let Some(returned) = op.value {
                        match model.pop() {
                            Some(expected) if expected != returned => {
                                return PropertyResult::fail(
                                    "LifoOrder",
                                    format!(
                                        "pop returned {} but model expected {} (step {})",
                                        returned, expected, op.step
                                    ),
                                    Some(self.replay_counterexample(&history, op.step)),
                                );
                            }
                            None => {
                                return PropertyResult::fail(
                                    "LifoOrder",
                                    format!(
                                        "pop returned {} but the model stack was empty (step {})",
                                        returned, op.step
                                    ),
                                    Some(self.replay_counterexample(&history, op.step)),
                                );
                            }
                            _ => {}
                        }
                    }
                }
                StackOpType::PopEmpty => {
                    if !model.is_empty() {
                        return PropertyResult::fail(
                            "LifoOrder",
                            format!(
                                "pop observed empty but the model holds {} values (step {})",
                                model.len(),
                                op.step
                            ),
                            Some(self.replay_counterexample(&history, op.step)),
                        );
                    }
                }
            }
        }

        PropertyResult::pass("LifoOrder")
    }

    /// Build a counterexample showing the interleaving up to the failing step.
    fn replay_counterexample(&self, history: &StackHistory, failing_step: u64) -> Counterexample {
        let mut ce = self.counterexample();
        for op in &history.operations {
            if op.step > failing_step {
                break;
            }
            let action = match (op.op_type, op.value) {
                (StackOpType::Push, Some(value)) => format!("push({})", value),
                (StackOpType::Pop, Some(value)) => format!("pop() -> {}", value),
                _ => "pop() -> empty".to_string(),
            };
            ce.add_action(ThreadAction {
                thread_id: op.thread_id,
                step: op.step,
                action,
                success: op.step != failing_step,
            });
        }
        ce
    }
}

impl<T: StackProperties> PropertyChecker for StackPropertyChecker<'_, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_no_lost_values(),
            self.check_no_phantom_values(),
            self.check_lifo_order(),
        ]
    }
}

fn value_counts(values: &[i64]) -> HashMap<i64, u64> {
    let mut counts = HashMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}
