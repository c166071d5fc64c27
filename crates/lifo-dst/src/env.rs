//! Simulation environment.
//!
//! `DstEnv` bundles everything a deterministic test needs: seeded
//! randomness, virtual time, fault injection, and (optionally) a
//! cooperative scheduler. Sub-components get derived seeds so their
//! streams stay independent of each other.

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;
use crate::scheduler::Scheduler;

/// One simulation's worth of deterministic machinery.
pub struct DstEnv {
    seed: u64,
    rng: DeterministicRng,
    clock: SimClock,
    fault: FaultInjector,
    scheduler: Option<Scheduler>,
}

impl DstEnv {
    /// Environment with default fault probabilities and no scheduler.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::build(seed, FaultConfig::default(), None)
    }

    /// Environment with explicit fault probabilities.
    #[must_use]
    pub fn with_fault_config(seed: u64, config: FaultConfig) -> Self {
        Self::build(seed, config, None)
    }

    /// Environment with a cooperative scheduler over `threads_count`
    /// simulated threads.
    #[must_use]
    pub fn with_scheduler(seed: u64, threads_count: usize) -> Self {
        Self::build(seed, FaultConfig::default(), Some(threads_count))
    }

    /// Environment with both a scheduler and explicit fault probabilities.
    #[must_use]
    pub fn for_harness(seed: u64, threads_count: usize, fault_config: FaultConfig) -> Self {
        Self::build(seed, fault_config, Some(threads_count))
    }

    fn build(seed: u64, fault_config: FaultConfig, threads_count: Option<usize>) -> Self {
        // Derived seeds keep the rng, fault, and scheduler streams
        // independent: consuming from one never shifts another.
        let rng = DeterministicRng::new(seed);
        let fault = FaultInjector::new(DeterministicRng::new(seed.wrapping_add(1)), fault_config);
        let scheduler = threads_count
            .map(|count| Scheduler::new(DeterministicRng::new(seed.wrapping_add(2)), count));

        Self {
            seed,
            rng,
            clock: SimClock::new(),
            fault,
            scheduler,
        }
    }

    /// The seed for reproduction.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Deterministic randomness.
    pub fn rng(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    /// Virtual time.
    pub fn clock(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    /// Fault injection.
    pub fn fault(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    /// Cooperative scheduler, if this environment simulates threads.
    pub fn scheduler(&mut self) -> Option<&mut Scheduler> {
        self.scheduler.as_mut()
    }

    /// Maybe stall the current thread; injected delays advance the
    /// virtual clock, never the wall clock.
    pub fn maybe_delay(&mut self) {
        if let Some(delay_us) = self.fault.should_delay() {
            self.clock.advance_us(delay_us);
        }
    }

    /// Reproduction banner.
    #[must_use]
    pub fn format_seed(&self) -> String {
        format!("DST_SEED={}", self.seed)
    }

    /// One-line run summary for test output.
    #[must_use]
    pub fn stats(&self) -> String {
        let fault_stats = self.fault.stats();
        format!(
            "DST_SEED={} virtual_time_ns={} faults={} delays={}",
            self.seed,
            self.clock.now_ns(),
            fault_stats.faults_count,
            fault_stats.delays_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_accessors() {
        let mut env = DstEnv::new(42);
        assert_eq!(env.seed(), 42);
        assert_eq!(env.clock().now_ns(), 0);
        assert!(env.scheduler().is_none());
        assert_eq!(env.format_seed(), "DST_SEED=42");
    }

    #[test]
    fn test_env_with_scheduler() {
        let mut env = DstEnv::with_scheduler(42, 4);
        let scheduler = env.scheduler().unwrap();
        assert_eq!(scheduler.current_thread(), 0);
    }

    #[test]
    fn test_streams_are_independent() {
        // Draining the main rng must not change fault decisions.
        let mut env_a = DstEnv::with_fault_config(7, FaultConfig::aggressive());
        let mut env_b = DstEnv::with_fault_config(7, FaultConfig::aggressive());

        for _ in 0..100 {
            env_a.rng().next_u64();
        }

        let faults_a: Vec<bool> = (0..100).map(|_| env_a.fault().should_fail()).collect();
        let faults_b: Vec<bool> = (0..100).map(|_| env_b.fault().should_fail()).collect();
        assert_eq!(faults_a, faults_b);
    }

    #[test]
    fn test_maybe_delay_advances_virtual_time() {
        let mut env = DstEnv::with_fault_config(7, FaultConfig::aggressive());
        for _ in 0..1000 {
            env.maybe_delay();
        }
        assert!(env.clock().now_ns() > 0, "no delay fired in 1000 boundaries");
    }
}
