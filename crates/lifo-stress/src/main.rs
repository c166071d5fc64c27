//! Real-thread stress runner for the stack backends.
//!
//! Hammers one backend with OS threads, then checks value conservation
//! and structural consistency at quiescence. The seed controls every
//! thread's operation mix, so a failing run is reproducible bit for bit
//! (modulo the actual interleaving, which the conservation checks are
//! insensitive to).
//!
//! # Usage
//!
//! ```bash
//! lifo-stress --backend treiber --threads 8 --ops 100000
//! lifo-stress --backend lock --seed 12345 --json
//! ```
//!
//! Exits non-zero if any property fails.

use std::collections::HashMap;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use serde_json::json;

use lifo_core::{Backend, BackendKind, LockBackend, Stack, TreiberBackend};
use lifo_dst::DeterministicRng;
use lifo_verify::{PropertyChecker, PropertyResult, StackHistory, StackProperties, StackPropertyChecker};

/// Upper bound on worker threads.
const THREADS_COUNT_MAX: usize = 64;

/// Default operations per thread.
const OPS_PER_THREAD_DEFAULT: u64 = 10_000;

/// Payloads are drawn from this span, so duplicates and negatives are
/// guaranteed at any realistic operation count.
const VALUE_SPAN: i64 = 500;

/// Stress one stack backend with real threads and verify conservation.
#[derive(Parser, Debug)]
#[command(name = "lifo-stress")]
#[command(about = "Concurrent stress runner for the LIFO stack backends")]
struct Cli {
    /// Backend to exercise: "lock" or "treiber".
    #[arg(long, default_value = "treiber")]
    backend: String,

    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Operations per thread.
    #[arg(long, default_value_t = OPS_PER_THREAD_DEFAULT)]
    ops: u64,

    /// Seed for the per-thread operation mixes (random if not set).
    #[arg(long)]
    seed: Option<u64>,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Everything one run produces.
struct StressReport {
    backend: BackendKind,
    seed: u64,
    threads: usize,
    ops_per_thread: u64,
    elapsed_ms: u128,
    pushed_total: u64,
    popped_total: u64,
    remaining: usize,
    audit_consistent: bool,
    properties: Vec<PropertyResult>,
}

impl StressReport {
    fn passed(&self) -> bool {
        self.audit_consistent && self.properties.iter().all(|r| r.holds)
    }

    fn ops_per_sec(&self) -> f64 {
        let total_ops = (self.threads as u64 * self.ops_per_thread) as f64;
        if self.elapsed_ms == 0 {
            return total_ops * 1_000.0;
        }
        total_ops * 1_000.0 / self.elapsed_ms as f64
    }

    fn render_text(&self) -> String {
        let mut lines = vec![format!(
            "lifo-stress backend={} threads={} ops_per_thread={} seed={}",
            self.backend, self.threads, self.ops_per_thread, self.seed
        )];
        lines.push(format!(
            "pushed={} popped={} remaining={} elapsed_ms={} ops_per_sec={:.0}",
            self.pushed_total,
            self.popped_total,
            self.remaining,
            self.elapsed_ms,
            self.ops_per_sec()
        ));
        lines.push(format!(
            "[{}] StructuralAudit",
            if self.audit_consistent { "PASS" } else { "FAIL" }
        ));
        for result in &self.properties {
            lines.push(result.format_status());
        }
        lines.join("\n")
    }

    fn render_json(&self) -> String {
        let properties: Vec<serde_json::Value> = self
            .properties
            .iter()
            .map(|r| {
                let mut entry = json!({
                    "name": r.name,
                    "holds": r.holds,
                });
                if let Some(ref violation) = r.violation {
                    entry["violation"] = json!(violation);
                }
                entry
            })
            .collect();

        let output = json!({
            "backend": self.backend.as_str(),
            "seed": self.seed,
            "threads": self.threads,
            "ops_per_thread": self.ops_per_thread,
            "elapsed_ms": self.elapsed_ms as u64,
            "ops_per_sec": self.ops_per_sec(),
            "pushed": self.pushed_total,
            "popped": self.popped_total,
            "remaining": self.remaining,
            "audit_consistent": self.audit_consistent,
            "properties": properties,
            "passed": self.passed(),
        });

        serde_json::to_string_pretty(&output).unwrap()
    }
}

/// Post-run bookkeeping in the shape the property checker wants.
///
/// No operation history is recorded at full speed (recording would
/// serialize the run), so only the conservation properties apply.
struct Observed {
    pushed: HashMap<i64, u64>,
    popped: HashMap<i64, u64>,
    contents: Vec<i64>,
}

impl StackProperties for Observed {
    fn pushed_counts(&self) -> HashMap<i64, u64> {
        self.pushed.clone()
    }

    fn popped_counts(&self) -> HashMap<i64, u64> {
        self.popped.clone()
    }

    fn contents(&self) -> Vec<i64> {
        self.contents.clone()
    }

    fn history(&self) -> StackHistory {
        StackHistory::new()
    }
}

fn run_stress<B: Backend + 'static>(
    kind: BackendKind,
    seed: u64,
    threads: usize,
    ops_per_thread: u64,
) -> StressReport {
    let stack: Arc<Stack<B>> = match Stack::new() {
        Ok(stack) => Arc::new(stack),
        Err(e) => {
            eprintln!("Error: backend init failed: {}", e);
            process::exit(1);
        }
    };

    let started = Instant::now();
    let mut handles = Vec::with_capacity(threads);

    for t in 0..threads {
        let stack = Arc::clone(&stack);
        handles.push(thread::spawn(move || {
            // Per-thread stream derived from the run seed
            let mut rng = DeterministicRng::new(seed.wrapping_add(t as u64 + 1));
            let mut pushed: HashMap<i64, u64> = HashMap::new();
            let mut popped: HashMap<i64, u64> = HashMap::new();

            for _ in 0..ops_per_thread {
                if rng.gen_bool(0.6) {
                    let value = rng.gen_range_i64(-VALUE_SPAN..VALUE_SPAN);
                    match stack.push(value) {
                        Ok(()) => {
                            *pushed.entry(value).or_insert(0) += 1;
                        }
                        Err(e) => {
                            // Allocation refusals leave the stack unchanged
                            eprintln!("push({}) failed: {}", value, e);
                        }
                    }
                } else if let Ok(value) = stack.pop() {
                    *popped.entry(value).or_insert(0) += 1;
                }
            }

            (pushed, popped)
        }));
    }

    let mut pushed: HashMap<i64, u64> = HashMap::new();
    let mut popped: HashMap<i64, u64> = HashMap::new();
    for handle in handles {
        match handle.join() {
            Ok((thread_pushed, thread_popped)) => {
                for (value, count) in thread_pushed {
                    *pushed.entry(value).or_insert(0) += count;
                }
                for (value, count) in thread_popped {
                    *popped.entry(value).or_insert(0) += count;
                }
            }
            Err(_) => {
                eprintln!("Error: worker thread panicked (seed={})", seed);
                process::exit(1);
            }
        }
    }
    let elapsed_ms = started.elapsed().as_millis();

    // Quiescent by now: every worker joined.
    let audit_consistent = stack.audit().is_consistent();
    let contents = stack.snapshot();
    let remaining = contents.len();

    let observed = Observed {
        pushed,
        popped,
        contents,
    };
    let checker = StackPropertyChecker::new(&observed).with_seed(seed);
    let properties: Vec<PropertyResult> = checker
        .check_all()
        .into_iter()
        .filter(|r| r.name != "LifoOrder") // nothing recorded to replay
        .collect();

    // Teardown path: pop everything out, then drop the empty stack.
    match stack.drain() {
        Ok(drained) => debug_assert!(
            drained.len() == remaining,
            "drain returned {} values, snapshot saw {}",
            drained.len(),
            remaining
        ),
        Err(e) => {
            eprintln!("Error: drain failed: {}", e);
            process::exit(1);
        }
    }

    let pushed_total: u64 = observed.pushed.values().sum();
    let popped_total: u64 = observed.popped.values().sum();

    StressReport {
        backend: kind,
        seed,
        threads,
        ops_per_thread,
        elapsed_ms,
        pushed_total,
        popped_total,
        remaining,
        audit_consistent,
        properties,
    }
}

fn main() {
    let cli = Cli::parse();

    let kind = match cli.backend.parse::<BackendKind>() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.threads == 0 {
        eprintln!("Error: --threads must be at least 1");
        process::exit(1);
    }
    let threads = cli.threads.min(THREADS_COUNT_MAX);

    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);

    let report = match kind {
        BackendKind::LockBased => run_stress::<LockBackend>(kind, seed, threads, cli.ops),
        BackendKind::NonBlocking => run_stress::<TreiberBackend>(kind, seed, threads, cli.ops),
    };

    if cli.json {
        println!("{}", report.render_json());
    } else {
        println!("{}", report.render_text());
    }

    if !report.passed() {
        process::exit(1);
    }
}
