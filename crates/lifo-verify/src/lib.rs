//! # lifo-verify
//!
//! Property checking for concurrent LIFO stacks.
//!
//! This crate provides:
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `StackProperties` and `StackPropertyChecker` for conservation and
//!   ordering checks over recorded stack bookkeeping
//! - `Counterexample` for rendering failure paths
//!
//! Checkers never panic on a violation; they report it as a value so
//! harnesses can aggregate results, render diagrams, and decide the
//! exit status themselves.

pub mod counterexample;
pub mod property;
pub mod stack;

pub use counterexample::{Counterexample, StateSnapshot, ThreadAction};
pub use property::{PropertyChecker, PropertyResult};
pub use stack::{StackHistory, StackOpType, StackOperation, StackProperties, StackPropertyChecker};
