//! Backend contract and selection.
//!
//! The stack is generic over its storage strategy. Both backends meet
//! the same contract; callers pick one at construction and nothing is
//! decided by conditional compilation.

use std::fmt;
use std::str::FromStr;

use crate::error::StackError;

/// Storage strategy selector, for configuration and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One mutex around the whole chain
    LockBased,
    /// Lock-free CAS loop over the head pointer
    NonBlocking,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LockBased => "lock",
            BackendKind::NonBlocking => "treiber",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lock" | "lock-based" | "mutex" => Ok(BackendKind::LockBased),
            "treiber" | "non-blocking" | "nonblocking" | "cas" | "lock-free" | "lockfree" => {
                Ok(BackendKind::NonBlocking)
            }
            other => Err(format!(
                "unknown backend '{}' (expected 'lock' or 'treiber')",
                other
            )),
        }
    }
}

/// Report from a structural audit of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    /// The chain from head is cycle-free
    pub acyclic: bool,
    /// Nodes reachable from head
    pub traversed: usize,
    /// The backend's length counter
    pub recorded: usize,
}

impl Consistency {
    /// True when the audit found nothing suspicious.
    ///
    /// Only meaningful at quiescence: under concurrent mutation the
    /// counter and the traversal legitimately disagree for a moment.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.acyclic && self.traversed == self.recorded
    }
}

/// A storage strategy for the stack.
///
/// `push` and `pop` are linearizable. `snapshot` and `audit` are
/// best-effort diagnostics: they must stay memory-safe under concurrent
/// mutation (never dereference reclaimed memory) but are only exact at
/// quiescence.
pub trait Backend: Send + Sync + Sized {
    /// Kind tag for this backend.
    const KIND: BackendKind;

    /// Construct empty backend state.
    fn init() -> Result<Self, StackError>;

    /// Place `value` on top of the stack.
    fn push(&self, value: i64) -> Result<(), StackError>;

    /// Remove and return the top value.
    fn pop(&self) -> Result<i64, StackError>;

    /// Number of stored values (approximate under concurrent mutation).
    fn len(&self) -> usize;

    /// True when no values are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current values, top to bottom.
    fn snapshot(&self) -> Vec<i64>;

    /// Structural audit of the chain.
    fn audit(&self) -> Consistency;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_aliases() {
        assert_eq!("lock".parse::<BackendKind>(), Ok(BackendKind::LockBased));
        assert_eq!("mutex".parse::<BackendKind>(), Ok(BackendKind::LockBased));
        assert_eq!("treiber".parse::<BackendKind>(), Ok(BackendKind::NonBlocking));
        assert_eq!("cas".parse::<BackendKind>(), Ok(BackendKind::NonBlocking));
        assert!("paxos".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_kind_display_round_trips() {
        for kind in [BackendKind::LockBased, BackendKind::NonBlocking] {
            assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_consistency_verdicts() {
        let clean = Consistency {
            acyclic: true,
            traversed: 4,
            recorded: 4,
        };
        assert!(clean.is_consistent());

        let miscounted = Consistency {
            acyclic: true,
            traversed: 4,
            recorded: 5,
        };
        assert!(!miscounted.is_consistent());

        let cyclic = Consistency {
            acyclic: false,
            traversed: 0,
            recorded: 0,
        };
        assert!(!cyclic.is_consistent());
    }
}
