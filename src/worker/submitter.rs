//! Job submission: the producer stage of the pipeline.
//!
//! The submitter derives one seed per index and feeds jobs into the bounded
//! job queue in index order. The queue's capacity is the backpressure point:
//! when workers fall behind, `send_async` parks the submitter instead of
//! letting derived jobs pile up in memory.
//!
//! ## Queue closure
//!
//! The submitter owns the only job [`Sender`]. Returning from [`Submitter::submit_all`]
//! drops it, which closes the queue and lets workers drain and exit. That
//! happens after the last job on a clean run, and also on cancellation or
//! when every worker has gone away, so workers are never left waiting.
//!
//! ## In-flight window
//!
//! With a window configured, each job first takes a permit from a
//! [`Semaphore`]. The writer hands permits back as records are emitted, which
//! caps the number of results that can wait in the reorder buffer. Jobs are
//! submitted in index order, so the job the writer is waiting on always
//! already holds a permit and the window cannot deadlock.

use anyhow::{Context, Result, anyhow};
use flume::Sender;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::seed::SeedDeriver;
use crate::types::{Job, Network};

pub struct Submitter {
    deriver: SeedDeriver,

    network: Network,

    count: u64,
}

impl Submitter {
    pub fn new(deriver: SeedDeriver, network: Network, count: u64) -> Self {
        Self { deriver, network, count }
    }

    /// Submits jobs `0..count` and closes the queue.
    ///
    /// Returns the number of jobs enqueued, which is less than `count` only if
    /// the run was cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue closed (all workers gone) or the window
    /// was closed before every job was submitted without cancellation.
    pub async fn submit_all(&self, sender: Sender<Job>, window: Option<&Semaphore>, cancel: &CancellationToken) -> Result<u64> {
        for index in 0..self.count {
            if let Some(window) = window {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Ok(self.stopped(index)),
                    permit = window.acquire() => permit.context("in-flight window closed")?.forget(),
                }
            }

            let job = Job { index, seed: self.deriver.derive(index), network: self.network };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(self.stopped(index)),
                sent = sender.send_async(job) => {
                    if sent.is_err() {
                        if cancel.is_cancelled() {
                            return Ok(self.stopped(index));
                        }
                        return Err(anyhow!("job queue closed after {index} of {} jobs", self.count));
                    }
                }
            }
        }

        debug!(jobs = self.count, "all jobs submitted");
        Ok(self.count)
    }

    fn stopped(&self, submitted: u64) -> u64 {
        debug!(submitted, total = self.count, "submission cancelled");
        submitted
    }
}
