//! Ordered record emission.
//!
//! Results reach the writer in completion order. The writer is the only
//! owner of the reorder [`Buffer`] and of the output stream: it parks early
//! results, writes every record exactly once in index order, and reports the
//! emitted count to the progress tracker. Each record is formatted in full
//! before it is handed to the stream, so a record is either written whole or
//! not at all.

use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use flume::Receiver;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::HASH_PREFIX_LEN;
use crate::types::{Failure, FailurePolicy, JobResult, Outcome};
use crate::ui::progress::Progress;
use crate::worker::buffer::Buffer;

/// Line format of emitted records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `<output>\n`
    Plain,

    /// `<first 6 hex chars of sha256(output)>,<output>\n`
    HashPrefixed,
}

impl Format {
    pub fn record(self, output: &str) -> String {
        match self {
            Self::Plain => format!("{output}\n"),
            Self::HashPrefixed => format!("{},{output}\n", hash_prefix(output)),
        }
    }
}

/// Short SHA-256 fingerprint of `output`, in lowercase hex.
pub fn hash_prefix(output: &str) -> String {
    let digest = Sha256::digest(output.as_bytes());
    let mut encoded = hex::encode(&digest[..HASH_PREFIX_LEN.div_ceil(2)]);
    encoded.truncate(HASH_PREFIX_LEN);
    encoded
}

/// What the writer produced.
#[derive(Debug, Default)]
pub struct Report {
    /// Records written to the stream.
    pub emitted: u64,

    /// Failed jobs skipped under [`FailurePolicy::Collect`], in index order.
    pub failures: Vec<Failure>,
}

pub struct Writer {
    /// Reordering buffer to restore sequence.
    buffer: Buffer,

    format: Format,

    policy: FailurePolicy,

    progress: Arc<dyn Progress>,

    /// Permits handed back to the submitter as records leave the buffer.
    window: Option<Arc<Semaphore>>,

    report: Report,
}

impl Report {
    /// Jobs accounted for, written or failed.
    pub fn handled(&self) -> u64 {
        self.emitted + self.failures.len() as u64
    }
}

impl Writer {
    #[inline]
    pub fn new(total: u64, format: Format, policy: FailurePolicy, progress: Arc<dyn Progress>) -> Self {
        Self { buffer: Buffer::new(total), format, policy, progress, window: None, report: Report::default() }
    }

    #[must_use]
    pub fn with_window(mut self, window: Arc<Semaphore>) -> Self {
        self.window = Some(window);
        self
    }

    /// Consumes results until the channel closes and writes them in order.
    ///
    /// Whatever was emitted before an error is still flushed to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error on write failure, on a failed job under
    /// [`FailurePolicy::FailFast`], on a malformed result index, or if the
    /// channel closes before every index was emitted and the run was not
    /// cancelled.
    pub async fn write_all<W: AsyncWrite + Unpin>(mut self, output: W, receiver: Receiver<JobResult>, cancel: &CancellationToken) -> Result<Report> {
        let mut writer = BufWriter::new(output);

        let drained = self.drain(&mut writer, receiver, cancel).await;

        // Ensure everything emitted so far reaches the sink, even on failure.
        let flushed = writer.flush().await.context("failed to flush output");

        drained?;
        flushed?;

        Ok(self.report)
    }

    async fn drain<W: AsyncWrite + Unpin>(&mut self, writer: &mut W, receiver: Receiver<JobResult>, cancel: &CancellationToken) -> Result<()> {
        while let Ok(result) = receiver.recv_async().await {
            if let (FailurePolicy::FailFast, Outcome::Failure(reason)) = (self.policy, &result.outcome) {
                bail!("job {} failed: {}", result.index, reason);
            }

            let ready = self.buffer.add(result)?;
            self.write_batch(writer, ready).await?;
        }

        // Covers the empty run and keeps the final render in step with the cursor.
        self.progress.update(self.buffer.next());

        if !self.buffer.is_complete() {
            ensure!(cancel.is_cancelled(), "result stream closed after {} records with {} still pending", self.buffer.next(), self.buffer.pending());
            debug!(emitted = self.buffer.next(), discarded = self.buffer.pending(), "stopped early, discarding out-of-order results");
        }

        Ok(())
    }

    async fn write_batch<W: AsyncWrite + Unpin>(&mut self, writer: &mut W, results: Vec<JobResult>) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let released = results.len();

        for r in results {
            match r.outcome {
                Outcome::Success(output) => {
                    writer.write_all(self.format.record(&output).as_bytes()).await.context("failed to write record")?;
                    self.report.emitted += 1;
                }
                Outcome::Failure(reason) => {
                    warn!(index = r.index, %reason, "job failed, skipping record");
                    self.report.failures.push(Failure { index: r.index, reason });
                }
            }
        }

        if let Some(window) = &self.window {
            window.add_permits(released);
        }

        self.progress.update(self.buffer.next());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flume::unbounded;

    use super::*;
    use crate::ui::progress::{Hidden, ProgressBar};

    fn writer(total: u64, format: Format, policy: FailurePolicy) -> Writer {
        Writer::new(total, format, policy, Arc::new(Hidden))
    }

    async fn write(writer: Writer, results: Vec<JobResult>) -> (Result<Report>, String) {
        let (tx, rx) = unbounded();
        for result in results {
            tx.send(result).unwrap();
        }
        drop(tx);

        let mut output = Vec::new();
        let report = writer.write_all(&mut output, rx, &CancellationToken::new()).await;
        (report, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_write_plain() {
        let results = vec![JobResult::ok(0, "alpha".into()), JobResult::ok(1, "beta".into())];
        let (report, output) = write(writer(2, Format::Plain, FailurePolicy::FailFast), results).await;

        assert_eq!(report.unwrap().emitted, 2);
        assert_eq!(output, "alpha\nbeta\n");
    }

    #[tokio::test]
    async fn test_write_reordering() {
        let results = vec![
            JobResult::ok(2, "address2".into()),
            JobResult::ok(0, "address0".into()),
            JobResult::ok(1, "address1".into()),
            JobResult::ok(4, "address4".into()),
            JobResult::ok(3, "address3".into()),
        ];
        let (report, output) = write(writer(5, Format::Plain, FailurePolicy::FailFast), results).await;

        assert_eq!(report.unwrap().emitted, 5);
        assert_eq!(output, "address0\naddress1\naddress2\naddress3\naddress4\n");
    }

    #[tokio::test]
    async fn test_write_hash_prefixed() {
        let address = "0x122b84B924B5f9bE23b7A8961685B3AB8224ebCa";
        let (report, output) = write(writer(1, Format::HashPrefixed, FailurePolicy::FailFast), vec![JobResult::ok(0, address.into())]).await;
        report.unwrap();

        assert_eq!(output, "878a0e,0x122b84B924B5f9bE23b7A8961685B3AB8224ebCa\n");
    }

    #[test]
    fn test_hash_prefix_shape() {
        let prefix = hash_prefix("0x122b84B924B5f9bE23b7A8961685B3AB8224ebCa");
        assert_eq!(prefix.len(), HASH_PREFIX_LEN);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        // sha256("abc") = ba7816bf...
        assert_eq!(hash_prefix("abc"), "ba7816");
        assert_eq!(Format::HashPrefixed.record("abc"), "ba7816,abc\n");
    }

    #[tokio::test]
    async fn test_fail_fast_flushes_earlier_records() {
        let error = anyhow::anyhow!("bad seed");
        let results = vec![JobResult::ok(0, "first".into()), JobResult::err(1, &error), JobResult::ok(2, "third".into())];
        let (report, output) = write(writer(3, Format::Plain, FailurePolicy::FailFast), results).await;

        let message = report.unwrap_err().to_string();
        assert!(message.contains("job 1 failed: bad seed"), "{message}");
        assert_eq!(output, "first\n");
    }

    #[tokio::test]
    async fn test_collect_skips_failed_records() {
        let error = anyhow::anyhow!("bad seed");
        let results = vec![JobResult::ok(2, "third".into()), JobResult::err(1, &error), JobResult::ok(0, "first".into())];
        let (report, output) = write(writer(3, Format::Plain, FailurePolicy::Collect), results).await;

        let report = report.unwrap();
        assert_eq!(report.emitted, 2);
        assert_eq!(report.handled(), 3);
        assert_eq!(report.failures, vec![Failure { index: 1, reason: "bad seed".into() }]);
        assert_eq!(output, "first\nthird\n");
    }

    #[tokio::test]
    async fn test_incomplete_stream_is_an_error() {
        let results = vec![JobResult::ok(0, "first".into()), JobResult::ok(2, "third".into())];
        let (report, output) = write(writer(3, Format::Plain, FailurePolicy::FailFast), results).await;

        assert!(report.is_err());
        assert_eq!(output, "first\n");
    }

    #[tokio::test]
    async fn test_incomplete_stream_after_cancel_is_partial() {
        let (tx, rx) = unbounded();
        tx.send(JobResult::ok(0, "first".into())).unwrap();
        tx.send(JobResult::ok(2, "third".into())).unwrap();
        drop(tx);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut output = Vec::new();
        let report = writer(3, Format::Plain, FailurePolicy::FailFast).write_all(&mut output, rx, &cancel).await.unwrap();

        assert_eq!(report.emitted, 1);
        assert_eq!(output, b"first\n");
    }

    #[tokio::test]
    async fn test_duplicate_index_is_an_error() {
        let results = vec![JobResult::ok(0, "first".into()), JobResult::ok(0, "again".into())];
        let (report, _) = write(writer(2, Format::Plain, FailurePolicy::FailFast), results).await;
        assert!(report.is_err());
    }

    #[tokio::test]
    async fn test_window_permits_returned_on_emit() {
        let window = Arc::new(Semaphore::new(0));
        let writer = writer(3, Format::Plain, FailurePolicy::FailFast).with_window(Arc::clone(&window));

        let results = vec![JobResult::ok(1, "b".into()), JobResult::ok(0, "a".into()), JobResult::ok(2, "c".into())];
        let (report, _) = write(writer, results).await;
        report.unwrap();

        assert_eq!(window.available_permits(), 3);
    }

    #[tokio::test]
    async fn test_progress_reaches_total() {
        let progress = Arc::new(ProgressBar::new(2, Vec::new()));
        let writer = Writer::new(2, Format::Plain, FailurePolicy::FailFast, Arc::clone(&progress) as Arc<dyn Progress>);

        let (report, _) = write(writer, vec![JobResult::ok(1, "b".into()), JobResult::ok(0, "a".into())]).await;
        report.unwrap();

        let rendered = progress.rendered();
        assert!(rendered.contains("2/2 (100.00%)"), "{rendered}");
        assert!(rendered.ends_with('\n'));
    }
}
