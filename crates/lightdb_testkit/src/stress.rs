//! Stress tests for LightDB.
//!
//! These helpers hammer the database and the atomic store with bursts of
//! writes, which is where write coalescing does its work.

use lightdb_core::{Database, Value};
use lightdb_storage::{AtomicStore, InMemoryBackend, StorageBackend};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of one stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Operations attempted.
    pub total_ops: usize,
    /// Operations that returned `Ok`.
    pub successful_ops: usize,
    /// Operations that returned an error.
    pub failed_ops: usize,
    /// Wall-clock time of the run.
    pub duration: Duration,
    /// Throughput over `duration`, zero for an instant run.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Builds a result from success and failure counts.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total_ops = successful + failed;
        let secs = duration.as_secs_f64();
        let ops_per_second = if secs > 0.0 { total_ops as f64 / secs } else { 0.0 };

        Self {
            total_ops,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a one-block report under `name`.
    pub fn print_summary(&self, name: &str) {
        println!("\n--- {name} ---");
        println!(
            "{} ops ({} ok, {} failed) in {:?}, {:.0} ops/s",
            self.total_ops, self.successful_ops, self.failed_ops, self.duration, self.ops_per_second
        );
    }
}

/// Knobs for the stress helpers.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per run, or per thread for concurrent runs.
    pub operations: usize,
    /// Number of distinct keys touched.
    pub key_count: usize,
    /// Thread count for [`stress_concurrent_stores`].
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            key_count: 100,
            threads: 4,
        }
    }
}

fn key_for(i: usize, config: &StressConfig) -> String {
    format!("stress.k{}", i % config.key_count.max(1))
}

/// Runs a burst of sets against distinct keys.
pub fn stress_sequential_sets(db: &mut Database, config: &StressConfig) -> StressTestResult {
    let started = Instant::now();
    let (mut successful, mut failed) = (0, 0);

    for i in 0..config.operations {
        match db.set(&key_for(i, config), i as i64) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, started.elapsed())
}

/// Runs a mix of set, add, get and remove.
pub fn stress_mixed_operations(db: &mut Database, config: &StressConfig) -> StressTestResult {
    let started = Instant::now();
    let (mut successful, mut failed) = (0, 0);

    for i in 0..config.operations {
        let key = key_for(i, config);

        let result = match i % 4 {
            0 => db.set(&key, Value::from(i as i64)).map(|_| ()),
            1 => db.add(&key, 1.0).map(|_| ()),
            2 => db.get(&key).map(|_| ()),
            _ => db.remove(&key).map(|_| ()),
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, started.elapsed())
}

/// Result of a concurrent write burst against independent stores.
#[derive(Debug, Clone)]
pub struct BurstResult {
    /// Timing and success counts.
    pub stats: StressTestResult,
    /// Physical writes per store.
    pub physical_writes: Vec<usize>,
    /// Whether every store ended with its thread's last payload.
    pub last_write_wins: bool,
}

/// Issues `config.operations` writes per thread, each thread on its own
/// in-memory store, and waits for every ticket.
pub fn stress_concurrent_stores(config: &StressConfig) -> BurstResult {
    let started = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let operations = config.operations;
            thread::spawn(move || {
                let backend = Arc::new(InMemoryBackend::new());
                let store = AtomicStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

                let tickets: Vec<_> = (0..operations)
                    .map(|i| store.write(format!("{{\"n\":{i}}}").into_bytes()))
                    .collect();

                let failed = tickets.iter().filter(|t| t.wait().is_err()).count();
                store.wait_idle();

                let expected = format!("{{\"n\":{}}}", operations.saturating_sub(1)).into_bytes();
                let landed = operations == 0 || backend.data() == Some(expected);
                (operations - failed, failed, backend.write_count(), landed)
            })
        })
        .collect();

    let mut successful = 0;
    let mut failed = 0;
    let mut physical_writes = Vec::with_capacity(config.threads);
    let mut last_write_wins = true;

    for handle in handles {
        match handle.join() {
            Ok((ok, err, writes, landed)) => {
                successful += ok;
                failed += err;
                physical_writes.push(writes);
                last_write_wins &= landed;
            }
            Err(_) => {
                failed += config.operations;
                last_write_wins = false;
            }
        }
    }

    BurstResult {
        stats: StressTestResult::new(successful, failed, started.elapsed()),
        physical_writes,
        last_write_wins,
    }
}
