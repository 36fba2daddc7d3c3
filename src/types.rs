//! Common type definitions for AddrMint.
//!
//! Provides the enums and structures passed between the pipeline stages.
//!
//! # Overview
//!
//! - [`Network`]: The address kind a job is transformed into
//! - [`FailurePolicy`]: Whether a failed job aborts the run
//! - [`Job`]: A unit of work produced by the submitter
//! - [`JobResult`]: The tagged outcome of one job
//! - [`Summary`]: What a finished run reports

use std::fmt::{Display, Formatter};
use std::time::Duration;

use strum::{Display as StrumDisplay, EnumString, IntoStaticStr, VariantNames};

use crate::seed::Seed;

/// Blockchain network whose address format a job produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, StrumDisplay, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    /// EIP-55 checksummed `0x` address.
    Ethereum,

    /// Base58Check P2PKH address over a compressed public key.
    Bitcoin,

    /// Base58 Ed25519 public key.
    Solana,
}

/// Behavior of the run when a job's transform fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failure.
    #[default]
    FailFast,

    /// Skip the failed record and report every failure at the end.
    Collect,
}

/// A unit of work: one index and the seed derived for it.
pub struct Job {
    /// Position of the record in the output stream.
    pub index: u64,

    /// Seed derived from the base seed and `index`.
    pub seed: Seed,

    /// Transform selector.
    pub network: Network,
}

/// Outcome of transforming one seed.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(Box<str>),
}

/// Result of processing a [`Job`], tagged with the job's index.
#[derive(Debug)]
pub struct JobResult {
    /// The originating job's index.
    pub index: u64,

    pub outcome: Outcome,
}

impl JobResult {
    #[inline]
    pub fn ok(index: u64, output: String) -> Self {
        Self { index, outcome: Outcome::Success(output) }
    }

    #[inline]
    pub fn err(index: u64, error: &anyhow::Error) -> Self {
        Self { index, outcome: Outcome::Failure(format!("{error:#}").into_boxed_str()) }
    }
}

/// A job that failed under [`FailurePolicy::Collect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub index: u64,
    pub reason: Box<str>,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "job {} failed: {}", self.index, self.reason)
    }
}

/// Report of a finished pipeline run.
#[derive(Debug)]
pub struct Summary {
    /// Records written to the output sink.
    pub emitted: u64,

    /// Failed jobs in index order; empty unless the policy is `Collect`.
    pub failures: Vec<Failure>,

    /// Wall time from start to the last flushed record.
    pub elapsed: Duration,

    /// Whether the run stopped early because it was cancelled.
    pub cancelled: bool,
}

impl Summary {
    /// Records written per second.
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.emitted as f64 / secs } else { 0.0 }
    }
}
