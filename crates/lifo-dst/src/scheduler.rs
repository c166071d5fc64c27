//! Deterministic cooperative scheduler.
//!
//! Simulated threads run one at a time; at every yield point the
//! scheduler decides whether the current thread keeps running or
//! another takes over. Decisions come from a seeded RNG, so a seed
//! reproduces the exact interleaving.

use crate::random::DeterministicRng;

/// Default probability of switching at a yield point.
const SWITCH_PROBABILITY_DEFAULT: f64 = 0.2;

/// Outcome of a yield point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Current thread keeps running
    Continue,
    /// Control passes to the given thread
    SwitchTo(usize),
}

/// Picks which simulated thread runs next.
pub struct Scheduler {
    rng: DeterministicRng,
    threads_count: usize,
    current: usize,
    switch_probability: f64,
    switches_count: u64,
}

impl Scheduler {
    /// Create a scheduler over `threads_count` simulated threads.
    #[must_use]
    pub fn new(rng: DeterministicRng, threads_count: usize) -> Self {
        debug_assert!(threads_count > 0, "Must have at least one thread");
        Self {
            rng,
            threads_count,
            current: 0,
            switch_probability: SWITCH_PROBABILITY_DEFAULT,
            switches_count: 0,
        }
    }

    /// Override the switch probability (e.g., from a harness config).
    pub fn set_switch_probability(&mut self, probability: f64) {
        debug_assert!(
            (0.0..=1.0).contains(&probability),
            "switch probability out of range: {}",
            probability
        );
        self.switch_probability = probability;
    }

    /// The thread currently scheduled to run.
    #[must_use]
    pub fn current_thread(&self) -> usize {
        self.current
    }

    /// Context switches so far.
    #[must_use]
    pub fn switches_count(&self) -> u64 {
        self.switches_count
    }

    /// Yield point: keep running or switch to a randomly chosen other thread.
    pub fn decide(&mut self) -> ScheduleDecision {
        if self.threads_count > 1 && self.rng.gen_bool(self.switch_probability) {
            let next = self.pick_other();
            self.current = next;
            self.switches_count += 1;
            ScheduleDecision::SwitchTo(next)
        } else {
            ScheduleDecision::Continue
        }
    }

    /// Unconditionally move to the next thread, round-robin.
    ///
    /// Used when the current thread has finished its work; round-robin
    /// guarantees every unfinished thread is eventually scheduled.
    pub fn force_switch(&mut self) -> usize {
        self.current = (self.current + 1) % self.threads_count;
        self.switches_count += 1;
        self.current
    }

    fn pick_other(&mut self) -> usize {
        let mut next = self.rng.gen_range(0..self.threads_count as u64 - 1) as usize;
        if next >= self.current {
            next += 1;
        }
        next
    }
}
