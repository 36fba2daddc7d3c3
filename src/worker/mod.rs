use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::AsyncWrite;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::address::{Addresses, Transform};
use crate::config::Config;
use crate::seed::SeedDeriver;
use crate::types::Summary;
use crate::ui::progress::{Hidden, Progress};
use crate::worker::executor::Executor;
use crate::worker::pipeline::Pipeline;
use crate::worker::submitter::Submitter;
use crate::worker::writer::{Format, Writer};

pub mod buffer;
pub mod executor;
pub mod pipeline;
pub mod submitter;
pub mod writer;

/// Generates `config.count` records into `output` with the default transforms.
///
/// # Errors
///
/// See [`Worker::process`].
pub async fn run<W: AsyncWrite + Unpin>(config: Config, output: W) -> Result<Summary> {
    Worker::new(config)?.process(output).await
}

/// Parallel generation pipeline.
///
/// Orchestrates the stages of one run:
/// - A worker pool that transforms jobs on blocking threads
/// - A submitter task that derives jobs in index order
/// - A writer that reorders results and emits them in index order
pub struct Worker {
    config: Config,

    transform: Arc<dyn Transform>,

    progress: Arc<dyn Progress>,

    cancel: CancellationToken,
}

impl Worker {
    /// Creates a pipeline for `config` using the address transforms and no progress display.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transform: Arc::new(Addresses), progress: Arc::new(Hidden), cancel: CancellationToken::new() })
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Lets the caller stop the run early through `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the pipeline to completion and writes every record to `output`.
    ///
    /// Lifecycle: workers start first and block on the empty queue; the
    /// submitter then fills the queue and closes it after the last job; the
    /// executor closes the result channel once every worker has exited; the
    /// writer drains results on the calling task until that channel closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot start, a job fails under
    /// the fail-fast policy, writing fails, or an ordering invariant is
    /// violated. Records emitted before the error are still flushed.
    pub async fn process<W: AsyncWrite + Unpin>(self, output: W) -> Result<Summary> {
        let start = Instant::now();
        let Self { config, transform, progress, cancel } = self;

        // Internal stops must not leak into the caller's token.
        let cancel = cancel.child_token();

        let workers = config.effective_workers();
        if config.workers.is_some_and(|requested| requested > workers) {
            info!(workers, "adjusted number of workers based on item count");
        }

        let queue_capacity = config.queue_capacity();
        let (task_sender, task_receiver) = flume::bounded(queue_capacity);
        let (result_sender, result_receiver) = flume::bounded(config.result_buffer);
        let window = config.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));

        debug!(count = config.count, workers, queue_capacity, result_buffer = config.result_buffer, "starting pipeline");

        // Workers, plus closing the result channel once they have all exited.
        let executor = Executor::new(Pipeline::new(transform), workers);
        let executor_cancel = cancel.clone();
        let executor_handle = tokio::task::spawn_blocking(move || executor.process(task_receiver, result_sender, &executor_cancel));

        // Submission; the job queue closes when this task ends.
        let format = if config.hash_prefix { Format::HashPrefixed } else { Format::Plain };
        let (count, network, policy) = (config.count, config.network, config.policy);
        let submitter = Submitter::new(SeedDeriver::new(config.seed), network, count);
        let submit_window = window.clone();
        let submit_cancel = cancel.clone();
        let submit_handle = tokio::spawn(async move { submitter.submit_all(task_sender, submit_window.as_deref(), &submit_cancel).await });

        let mut writer = Writer::new(count, format, policy, Arc::clone(&progress));
        if let Some(window) = window {
            writer = writer.with_window(window);
        }

        let written = writer.write_all(output, result_receiver, &cancel).await;

        if written.is_err() {
            // Unblocks the submitter; workers exit once their next send fails.
            cancel.cancel();
        }

        let submitted = submit_handle.await.context("submission task panicked")?;
        let executed = executor_handle.await.context("worker pool panicked")?;

        let stopped = match &written {
            Ok(report) => cancel.is_cancelled() && report.handled() < count,
            Err(_) => true,
        };
        if stopped {
            progress.interrupt();
        }

        executed?;
        let report = written?;
        let submitted = submitted?;

        // A cancellation that lands after the last record changes nothing.
        let cancelled = report.handled() < count;
        debug!(submitted, emitted = report.emitted, failed = report.failures.len(), cancelled, "pipeline finished");

        Ok(Summary { emitted: report.emitted, failures: report.failures, elapsed: start.elapsed(), cancelled })
    }
}
