//! # lifo-dst
//!
//! Deterministic Simulation Testing for the concurrent stack.
//!
//! Inspired by FoundationDB and TigerBeetle, this crate simulates time,
//! randomness, scheduling, and faults deterministically. All behavior is
//! reproducible from a single seed.
//!
//! ## Usage
//!
//! ```rust
//! use lifo_dst::DstEnv;
//!
//! let seed = 12345;
//! let mut env = DstEnv::new(seed);
//!
//! // Deterministic time
//! let now = env.clock().now_ns();
//! env.clock().advance_ns(1_000_000); // 1ms
//!
//! // Deterministic randomness
//! let value = env.rng().next_u64();
//! let choice = env.rng().gen_range(0..10);
//!
//! // Deterministic fault injection
//! if env.fault().should_fail() {
//!     // Simulate failure
//! }
//! # let _ = (now, value, choice);
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a failing test:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

pub mod clock;
pub mod env;
pub mod fault;
pub mod harness;
pub mod random;
pub mod runner;
pub mod scheduler;

pub use clock::SimClock;
pub use env::DstEnv;
pub use fault::{FaultConfig, FaultInjector, FaultStats};
pub use harness::{DstHarness, HarnessConfig, HarnessResult};
pub use random::DeterministicRng;
pub use runner::{run_dst_scenario, DstOp, DstResult, DstRunner, DstStats, FaultPoint, FaultType, SimStack};
pub use scheduler::{ScheduleDecision, Scheduler};

/// Get the DST seed from the environment or generate a random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    match std::env::var("DST_SEED") {
        Ok(s) => {
            let seed: u64 = s.parse().expect("DST_SEED must be a valid u64");
            println!("DST_SEED={} (from environment)", seed);
            seed
        }
        Err(_) => {
            let seed = rand::random::<u64>();
            println!("DST_SEED={} (randomly generated)", seed);
            seed
        }
    }
}
