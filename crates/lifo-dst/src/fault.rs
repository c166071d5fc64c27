//! Deterministic fault injection.
//!
//! The injector answers two questions at operation boundaries:
//! "should this operation fail?" and "should this thread stall?".
//! Both answers come from a seeded RNG, so a seed reproduces the
//! exact same fault pattern.

use crate::random::DeterministicRng;

/// Fault injection probabilities.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Probability that an operation boundary injects a fault
    pub fail_probability: f64,
    /// Probability that a thread is delayed between operations
    pub delay_probability: f64,
    /// Maximum injected delay in microseconds
    pub max_delay_us: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            fail_probability: 0.01,
            delay_probability: 0.05,
            max_delay_us: 100,
        }
    }
}

impl FaultConfig {
    /// No faults at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            fail_probability: 0.0,
            delay_probability: 0.0,
            max_delay_us: 0,
        }
    }

    /// Heavy fault load for stress runs.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            fail_probability: 0.1,
            delay_probability: 0.2,
            max_delay_us: 1_000,
        }
    }
}

/// Counters for injected faults.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultStats {
    pub faults_count: u64,
    pub delays_count: u64,
}

/// Seeded fault injector.
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
    stats: FaultStats,
}

impl FaultInjector {
    /// Create an injector with its own RNG stream.
    #[must_use]
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&config.fail_probability),
            "fail_probability out of range"
        );
        debug_assert!(
            (0.0..=1.0).contains(&config.delay_probability),
            "delay_probability out of range"
        );
        Self {
            rng,
            config,
            stats: FaultStats::default(),
        }
    }

    /// Should the current operation fail?
    pub fn should_fail(&mut self) -> bool {
        if self.rng.gen_bool(self.config.fail_probability) {
            self.stats.faults_count += 1;
            true
        } else {
            false
        }
    }

    /// Should the current thread stall, and for how many microseconds?
    pub fn should_delay(&mut self) -> Option<u64> {
        if self.config.max_delay_us == 0 {
            return None;
        }
        if self.rng.gen_bool(self.config.delay_probability) {
            self.stats.delays_count += 1;
            Some(self.rng.gen_range(1..self.config.max_delay_us + 1))
        } else {
            None
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> FaultStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_config_never_fires() {
        let mut injector = FaultInjector::new(DeterministicRng::new(1), FaultConfig::none());
        for _ in 0..1000 {
            assert!(!injector.should_fail());
            assert!(injector.should_delay().is_none());
        }
        assert_eq!(injector.stats().faults_count, 0);
        assert_eq!(injector.stats().delays_count, 0);
    }

    #[test]
    fn test_aggressive_config_fires() {
        let mut injector =
            FaultInjector::new(DeterministicRng::new(1), FaultConfig::aggressive());
        let mut fired = 0;
        for _ in 0..1000 {
            if injector.should_fail() {
                fired += 1;
            }
        }
        assert!(fired > 0, "aggressive config never injected a fault");
        assert_eq!(injector.stats().faults_count, fired);
    }

    #[test]
    fn test_delay_bounded_by_config() {
        let mut injector =
            FaultInjector::new(DeterministicRng::new(9), FaultConfig::aggressive());
        for _ in 0..1000 {
            if let Some(delay_us) = injector.should_delay() {
                assert!(delay_us >= 1);
                assert!(delay_us <= 1_000);
            }
        }
    }

    #[test]
    fn test_same_seed_same_faults() {
        let decisions = |seed: u64| -> Vec<bool> {
            let mut injector =
                FaultInjector::new(DeterministicRng::new(seed), FaultConfig::default());
            (0..200).map(|_| injector.should_fail()).collect()
        };
        assert_eq!(decisions(123), decisions(123));
    }
}
