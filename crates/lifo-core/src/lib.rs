//! # lifo-core
//!
//! Concurrent LIFO stack of `i64` values with two interchangeable
//! backends behind one facade:
//!
//! | Backend | Progress | Storage |
//! |---------|----------|---------|
//! | `LockBackend` | blocking | one mutex over a boxed chain |
//! | `TreiberBackend` | lock-free | CAS over epoch-managed nodes |
//!
//! The backend is chosen at construction, as a type parameter, and the
//! two expose identical semantics: LIFO order, linearizable push/pop,
//! and a distinguishable [`StackError::Empty`] so that every `i64`
//! (zero and negatives included) is an ordinary payload.
//!
//! ```
//! use lifo_core::{Stack, StackError, TreiberStack};
//!
//! let stack: TreiberStack = Stack::new()?;
//! stack.push(-7)?;
//! stack.push(0)?;
//! assert_eq!(stack.pop(), Ok(0));
//! assert_eq!(stack.pop(), Ok(-7));
//! assert_eq!(stack.pop(), Err(StackError::Empty));
//! # Ok::<(), StackError>(())
//! ```
//!
//! # Verification layers
//!
//! - `tracked`: a recording wrapper checked by `lifo-verify`
//! - `loom_shadow`: the CAS discipline under loom's model checker
//! - `kani_proofs`: bounded proofs over symbolic values
//! - the `lifo-dst` harnesses drive both backends under seeded
//!   schedules and injected faults (see `tests/`)

pub mod backend;
pub mod error;
pub mod kani_proofs;
pub mod lock;
pub mod loom_shadow;
pub mod stack;
pub mod tracked;
pub mod treiber;

mod alloc;

pub use backend::{Backend, BackendKind, Consistency};
pub use error::StackError;
pub use lock::LockBackend;
pub use loom_shadow::ShadowStack;
pub use stack::{LockStack, Stack, TreiberStack};
pub use tracked::Tracked;
pub use treiber::TreiberBackend;
