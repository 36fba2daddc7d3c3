//! Parallel job execution on a dedicated Rayon pool.
//!
//! One pool thread per effective worker, each running the same loop: take a
//! job from the shared queue, transform it, send the tagged result on. The
//! job queue closing is the only way a worker loop ends normally.
//!
//! # Thread Safety
//!
//! Workers share the [`Pipeline`] by reference; the transform behind it is
//! `Send + Sync` and stateless.

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use rayon::ThreadPoolBuilder;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::{Job, JobResult};
use crate::worker::pipeline::Pipeline;

/// Fixed-size pool of interchangeable workers.
pub struct Executor {
    pipeline: Pipeline,

    /// Number of worker loops, already clamped to the job count.
    concurrency: usize,
}

impl Executor {
    #[inline]
    pub fn new(pipeline: Pipeline, concurrency: usize) -> Self {
        Self { pipeline, concurrency }
    }

    /// Runs every worker until the job queue is closed and drained.
    ///
    /// Returns only after all workers have exited, and drops `results` on the
    /// way out, so the result channel closes exactly when the last worker is
    /// done.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker threads cannot be spawned.
    pub fn process(&self, tasks: Receiver<Job>, results: Sender<JobResult>, cancel: &CancellationToken) -> Result<()> {
        if self.concurrency == 0 {
            return Ok(());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("addrmint-worker-{i}"))
            .build()
            .context("failed to start worker pool")?;

        pool.scope(|scope| {
            for id in 0..self.concurrency {
                let tasks = tasks.clone();
                let results = results.clone();
                let pipeline = &self.pipeline;

                scope.spawn(move |_| Self::worker_loop(id, pipeline, &tasks, &results, cancel));
            }
        });

        debug!(workers = self.concurrency, "all workers finished");
        Ok(())
    }

    fn worker_loop(id: usize, pipeline: &Pipeline, tasks: &Receiver<Job>, results: &Sender<JobResult>, cancel: &CancellationToken) {
        let mut handled = 0u64;

        for job in tasks.iter() {
            // A cancelled run finishes what is in flight but takes no new work.
            if cancel.is_cancelled() {
                break;
            }

            let result = pipeline.process(&job);

            // The writer hung up after a fatal error; nothing left to do.
            if results.send(result).is_err() {
                break;
            }

            handled += 1;
        }

        debug!(worker = id, handled, "worker exiting");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flume::{bounded, unbounded};

    use super::*;
    use crate::address::Addresses;
    use crate::secret::BaseSeed;
    use crate::seed::SeedDeriver;
    use crate::types::Network;

    fn jobs(count: u64) -> Vec<Job> {
        let deriver = SeedDeriver::new(BaseSeed::from_int(7));
        (0..count).map(|index| Job { index, seed: deriver.derive(index), network: Network::Solana }).collect()
    }

    #[test]
    fn test_every_job_processed_once() {
        let executor = Executor::new(Pipeline::new(Arc::new(Addresses)), 4);
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();

        for job in jobs(50) {
            task_tx.send(job).unwrap();
        }
        drop(task_tx);

        executor.process(task_rx, result_tx, &CancellationToken::new()).unwrap();

        let mut seen: Vec<u64> = result_rx.iter().map(|r| r.index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_result_channel_closes_after_workers() {
        let executor = Executor::new(Pipeline::new(Arc::new(Addresses)), 2);
        let (task_tx, task_rx) = bounded(4);
        let (result_tx, result_rx) = unbounded();
        drop(task_tx);

        executor.process(task_rx, result_tx, &CancellationToken::new()).unwrap();

        assert!(result_rx.recv().is_err());
    }

    #[test]
    fn test_zero_workers() {
        let executor = Executor::new(Pipeline::new(Arc::new(Addresses)), 0);
        let (_task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();

        executor.process(task_rx, result_tx, &CancellationToken::new()).unwrap();

        assert!(result_rx.recv().is_err());
    }

    #[test]
    fn test_cancelled_workers_take_no_new_jobs() {
        let executor = Executor::new(Pipeline::new(Arc::new(Addresses)), 3);
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();

        for job in jobs(20) {
            task_tx.send(job).unwrap();
        }
        drop(task_tx);

        let cancel = CancellationToken::new();
        cancel.cancel();
        executor.process(task_rx, result_tx, &cancel).unwrap();

        assert_eq!(result_rx.iter().count(), 0);
    }
}
