//! Global configuration constants and the runtime pipeline configuration.
//!
//! The constants fix the output format and the progress display. [`Config`]
//! carries the per-run settings and resolves the defaults that depend on
//! the machine (worker count) or on other settings (queue capacity).

use std::thread;
use std::time::Duration;

use anyhow::{Result, ensure};
use tokio::sync::Semaphore;

use crate::secret::BaseSeed;
use crate::types::{FailurePolicy, Network};

/// Application name used in the banner and the CLI.
pub const APP_NAME: &str = "AddrMint";

/// Length in bytes of a derived per-item seed (one SHA-256 digest).
pub const SEED_LEN: usize = 32;

/// Length in bytes of a randomly generated base seed.
pub const RANDOM_SEED_LEN: usize = 32;

/// Number of hex characters of the SHA-256 digest kept in hash-prefixed records.
pub const HASH_PREFIX_LEN: usize = 6;

/// Job queue capacity per worker when no explicit capacity is configured.
pub const QUEUE_FACTOR: usize = 2;

/// Default capacity of the result channel between workers and the writer.
///
/// Sized well above the job queue so that bursts of completions never stall
/// workers while the single-threaded writer catches up.
pub const DEFAULT_RESULT_BUFFER: usize = 10_000;

/// Worker count used when the available parallelism cannot be detected.
pub const FALLBACK_WORKERS: usize = 4;

/// Number of glyphs in the rendered progress bar.
pub const PROGRESS_WIDTH: usize = 50;

/// Minimum time between two progress renders, except for the final one.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Settings for one pipeline run.
pub struct Config {
    /// Number of records to generate.
    pub count: u64,

    /// Root of every derived per-item seed.
    pub seed: BaseSeed,

    /// Address kind each job is transformed into.
    pub network: Network,

    /// Requested worker count; `None` uses the available parallelism.
    pub workers: Option<usize>,

    /// Job queue capacity; `None` uses `QUEUE_FACTOR` per effective worker.
    pub queue_capacity: Option<usize>,

    /// Result channel capacity.
    pub result_buffer: usize,

    /// Prefix each record with a short SHA-256 digest of the output.
    pub hash_prefix: bool,

    /// What to do when a single job fails.
    pub policy: FailurePolicy,

    /// Upper bound on jobs submitted but not yet emitted.
    pub max_in_flight: Option<usize>,
}

impl Config {
    pub fn new(count: u64, seed: BaseSeed, network: Network) -> Self {
        Self {
            count,
            seed,
            network,
            workers: None,
            queue_capacity: None,
            result_buffer: DEFAULT_RESULT_BUFFER,
            hash_prefix: false,
            policy: FailurePolicy::default(),
            max_in_flight: None,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity;
        self
    }

    #[must_use]
    pub fn with_hash_prefix(mut self, enabled: bool) -> Self {
        self.hash_prefix = enabled;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_in_flight(mut self, window: usize) -> Self {
        self.max_in_flight = Some(window);
        self
    }

    /// Rejects settings that would leave the pipeline unable to make progress.
    ///
    /// # Errors
    ///
    /// Returns an error if any explicitly configured size is zero.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.workers != Some(0), "worker count must be at least 1");
        ensure!(self.queue_capacity != Some(0), "queue capacity must be at least 1");
        ensure!(self.result_buffer > 0, "result buffer capacity must be at least 1");
        ensure!(self.max_in_flight != Some(0), "in-flight window must be at least 1");
        ensure!(self.max_in_flight.is_none_or(|n| n <= Semaphore::MAX_PERMITS), "in-flight window must be at most {}", Semaphore::MAX_PERMITS);
        Ok(())
    }

    /// Worker count actually used: the requested or detected count, never more than `count`.
    pub fn effective_workers(&self) -> usize {
        let requested = self.workers.unwrap_or_else(|| thread::available_parallelism().map_or(FALLBACK_WORKERS, |p| p.get()));
        usize::try_from(self.count).map_or(requested, |count| requested.min(count))
    }

    /// Job queue capacity actually used.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or_else(|| self.effective_workers().saturating_mul(QUEUE_FACTOR).max(1))
    }
}
