use anyhow::{Result, ensure};
use hashbrown::HashMap;

use crate::types::JobResult;

/// Holds results that arrived ahead of the emission cursor.
///
/// Every key is at least `next_idx`, and `next_idx` only moves forward. In
/// the worst case (the first job finishes last) the buffer holds every other
/// result of the run.
pub struct Buffer {
    buffer: HashMap<u64, JobResult>,

    next_idx: u64,

    end: u64,
}

impl Buffer {
    /// Creates a buffer expecting indices `0..end`.
    #[inline]
    pub fn new(end: u64) -> Self {
        Self { buffer: HashMap::new(), next_idx: 0, end }
    }

    /// Stores `result` and returns the contiguous run now ready, in index order.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is outside `0..end` or was already seen.
    /// Either means a worker or the submitter is broken.
    #[inline]
    pub fn add(&mut self, result: JobResult) -> Result<Vec<JobResult>> {
        let index = result.index;
        ensure!(index < self.end, "result index {index} outside [0, {})", self.end);
        ensure!(index >= self.next_idx && !self.buffer.contains_key(&index), "duplicate result for index {index}");

        self.buffer.insert(index, result);

        let mut ready: Vec<JobResult> = Vec::new();

        while let Some(result) = self.buffer.remove(&self.next_idx) {
            ready.push(result);
            self.next_idx += 1;
        }

        Ok(ready)
    }

    /// Index of the next result to emit.
    #[inline]
    pub fn next(&self) -> u64 {
        self.next_idx
    }

    /// Number of results waiting for an earlier index.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.next_idx == self.end
    }
}
