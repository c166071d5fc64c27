//! Simulated time.
//!
//! The simulation never reads the wall clock; tests advance virtual
//! time explicitly, so a run is reproducible regardless of host load.

/// Virtual clock counting nanoseconds since simulation start.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ns: u64,
}

impl SimClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self { now_ns: 0 }
    }

    /// Current virtual time in nanoseconds.
    #[must_use]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Advance by nanoseconds.
    pub fn advance_ns(&mut self, ns: u64) {
        self.now_ns = self.now_ns.saturating_add(ns);
    }

    /// Advance by microseconds.
    pub fn advance_us(&mut self, us: u64) {
        self.advance_ns(us.saturating_mul(1_000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now_ns(), 0);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut clock = SimClock::new();
        clock.advance_ns(500);
        assert_eq!(clock.now_ns(), 500);
        clock.advance_us(2);
        assert_eq!(clock.now_ns(), 2_500);
    }

    #[test]
    fn test_advance_saturates() {
        let mut clock = SimClock::new();
        clock.advance_ns(u64::MAX);
        clock.advance_ns(1);
        assert_eq!(clock.now_ns(), u64::MAX);
    }
}
