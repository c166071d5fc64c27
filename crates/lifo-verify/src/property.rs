//! Property-check results.
//!
//! Every invariant check reports through `PropertyResult`, so callers
//! can aggregate outcomes across checkers without caring which
//! property produced them.

use crate::counterexample::Counterexample;

/// Outcome of checking a single named property.
#[derive(Debug, Clone)]
pub struct PropertyResult {
    /// Property name (e.g., "NoLostValues")
    pub name: &'static str,
    /// Whether the property held
    pub holds: bool,
    /// Violation description if it did not
    pub violation: Option<String>,
    /// Counterexample if one was captured
    pub counterexample: Option<Counterexample>,
}

impl PropertyResult {
    /// Create a passing result.
    #[must_use]
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            holds: true,
            violation: None,
            counterexample: None,
        }
    }

    /// Create a failing result with an optional counterexample.
    #[must_use]
    pub fn fail(
        name: &'static str,
        violation: impl Into<String>,
        counterexample: Option<Counterexample>,
    ) -> Self {
        Self {
            name,
            holds: false,
            violation: Some(violation.into()),
            counterexample,
        }
    }

    /// Format as a single-line status.
    #[must_use]
    pub fn format_status(&self) -> String {
        if self.holds {
            format!("[PASS] {}", self.name)
        } else {
            format!(
                "[FAIL] {}: {}",
                self.name,
                self.violation.as_deref().unwrap_or("unspecified violation")
            )
        }
    }
}

/// A checker that verifies a fixed set of properties against one subject.
pub trait PropertyChecker {
    /// Run every check and collect the results.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// True when every checked property holds.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// The first violated property, if any.
    fn first_violation(&self) -> Option<PropertyResult> {
        self.check_all().into_iter().find(|r| !r.holds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedChecker {
        results: Vec<PropertyResult>,
    }

    impl PropertyChecker for CannedChecker {
        fn check_all(&self) -> Vec<PropertyResult> {
            self.results.clone()
        }
    }

    #[test]
    fn test_pass_result() {
        let result = PropertyResult::pass("NoLostValues");
        assert!(result.holds);
        assert!(result.violation.is_none());
        assert_eq!(result.format_status(), "[PASS] NoLostValues");
    }

    #[test]
    fn test_fail_result() {
        let result = PropertyResult::fail("LifoOrder", "pop returned 2, expected 3", None);
        assert!(!result.holds);
        assert!(result.format_status().contains("[FAIL] LifoOrder"));
        assert!(result.format_status().contains("expected 3"));
    }

    #[test]
    fn test_all_hold() {
        let checker = CannedChecker {
            results: vec![PropertyResult::pass("A"), PropertyResult::pass("B")],
        };
        assert!(checker.all_hold());
        assert!(checker.first_violation().is_none());
    }

    #[test]
    fn test_first_violation() {
        let checker = CannedChecker {
            results: vec![
                PropertyResult::pass("A"),
                PropertyResult::fail("B", "broken", None),
                PropertyResult::fail("C", "also broken", None),
            ],
        };
        assert!(!checker.all_hold());
        let first = checker.first_violation().unwrap();
        assert_eq!(first.name, "B");
    }
}
