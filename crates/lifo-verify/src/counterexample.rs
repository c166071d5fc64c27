//! Counterexample representation and rendering.
//!
//! When a property violation is detected, a counterexample shows
//! the exact sequence of operations that led to the failure.

/// A counterexample showing the failure path.
///
/// Contains the sequence of states and thread actions that led
/// to an invariant violation. Can be rendered as a human-readable
/// thread diagram.
#[derive(Debug, Clone)]
pub struct Counterexample {
    /// Sequence of state snapshots
    pub states: Vec<StateSnapshot>,
    /// Thread interleaving that caused the failure
    pub interleaving: Vec<ThreadAction>,
    /// DST seed for reproduction (if applicable)
    pub dst_seed: Option<u64>,
    /// Human-readable description of the failure (invariant violations, etc.)
    pub description: Option<String>,
}

/// Snapshot of stack state at a point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Step number in the execution
    pub step: u64,
    /// Description of the state
    pub description: String,
    /// Variable values at this point
    pub variables: Vec<(String, String)>,
}

/// Action taken by a thread.
#[derive(Debug, Clone)]
pub struct ThreadAction {
    /// Thread identifier
    pub thread_id: u64,
    /// Step number when this action occurred
    pub step: u64,
    /// Description of the action
    pub action: String,
    /// Whether this action succeeded
    pub success: bool,
}

impl Counterexample {
    /// Create a new empty counterexample.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            interleaving: Vec::new(),
            dst_seed: None,
            description: None,
        }
    }

    /// Create a counterexample with a DST seed for reproduction.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        Self {
            states: Vec::new(),
            interleaving: Vec::new(),
            dst_seed: Some(seed),
            description: None,
        }
    }

    /// Set the description for this counterexample.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a state snapshot.
    pub fn add_state(&mut self, state: StateSnapshot) {
        debug_assert!(
            self.states.is_empty() || state.step > self.states.last().unwrap().step,
            "States must be added in order"
        );
        self.states.push(state);
    }

    /// Add a thread action.
    pub fn add_action(&mut self, action: ThreadAction) {
        self.interleaving.push(action);
    }

    /// Render the counterexample as a human-readable thread diagram.
    ///
    /// Format:
    /// ```text
    /// DST_SEED=12345
    ///
    /// Step | Thread 0     | Thread 1     | State
    /// -----|--------------|--------------|-------
    ///    1 | push(42)     |              | head=N1
    ///    2 |              | pop() start  | head=N1
    ///    3 | push(43)     |              | head=N2
    ///    4 |              | CAS fail     | head=N2
    /// ```
    #[must_use]
    pub fn render_diagram(&self) -> String {
        let mut output = String::new();

        // DST seed for reproduction
        if let Some(seed) = self.dst_seed {
            output.push_str(&format!("DST_SEED={}\n\n", seed));
        }

        // Description (invariant violations, etc.)
        if let Some(ref desc) = self.description {
            output.push_str("Failure: ");
            output.push_str(desc);
            output.push_str("\n\n");
        }

        // Find all threads involved
        let mut threads: Vec<u64> = self.interleaving.iter().map(|a| a.thread_id).collect();
        threads.sort_unstable();
        threads.dedup();

        if threads.is_empty() {
            output.push_str("(no thread actions recorded)\n");
            return output;
        }

        // Header
        output.push_str("Step |");
        for tid in &threads {
            output.push_str(&format!(" Thread {} |", tid));
        }
        output.push_str(" State\n");

        output.push_str("-----|");
        for _ in &threads {
            output.push_str("----------|");
        }
        output.push_str("------\n");

        // Build step-by-step view
        let max_step = self.interleaving.iter().map(|a| a.step).max().unwrap_or(0);

        for step in 1..=max_step {
            output.push_str(&format!("{:4} |", step));

            for tid in &threads {
                let action = self
                    .interleaving
                    .iter()
                    .find(|a| a.step == step && a.thread_id == *tid);

                match action {
                    Some(a) => {
                        let status = if a.success { "" } else { " [FAIL]" };
                        output.push_str(&format!(" {}{} |", a.action, status));
                    }
                    None => output.push_str("          |"),
                }
            }

            // State at this step
            if let Some(state) = self.states.iter().find(|s| s.step == step) {
                output.push_str(&format!(" {}", state.description));
            }

            output.push('\n');
        }

        output
    }
}

impl Default for Counterexample {
    fn default() -> Self {
        Self::new()
    }
}
