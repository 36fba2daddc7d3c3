//! Progress reporting for the emission stage.
//!
//! The writer calls [`Progress::update`] with the number of records emitted so
//! far. [`ProgressBar`] is the default renderer: a fixed-width text bar
//! rewritten in place on the diagnostic stream, limited to one render per
//! interval except for the final one. [`Live`] delegates to `indicatif` for
//! an animated bar with rate and ETA, and [`Hidden`] draws nothing.

use std::io::{self, Stderr, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::config::{PROGRESS_INTERVAL, PROGRESS_WIDTH};

/// Sink for completion counts, shared by reference across tasks.
pub trait Progress: Send + Sync {
    /// Records that `completed` items are done.
    fn update(&self, completed: u64);

    /// Ends an unfinished display, e.g. after cancellation or an error.
    fn interrupt(&self) {}
}

/// A progress tracker that draws nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hidden;

impl Progress for Hidden {
    fn update(&self, _completed: u64) {}
}

struct State<W> {
    completed: u64,
    last_render: Option<Instant>,
    finished: bool,
    sink: W,
}

/// Rate-limited text progress bar.
///
/// All state lives behind one lock, and a render is only a few formatting
/// operations and one write, so concurrent callers wait at most that long.
pub struct ProgressBar<W = Stderr> {
    total: u64,
    width: usize,
    interval: Duration,
    state: Mutex<State<W>>,
}

impl ProgressBar<Stderr> {
    /// A bar over `total` items drawn on standard error.
    pub fn stderr(total: u64) -> Self {
        Self::new(total, io::stderr())
    }
}

impl<W: Write + Send> ProgressBar<W> {
    pub fn new(total: u64, sink: W) -> Self {
        Self {
            total,
            width: PROGRESS_WIDTH,
            interval: PROGRESS_INTERVAL,
            state: Mutex::new(State { completed: 0, last_render: None, finished: false, sink }),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render(&self, state: &mut State<W>) {
        let ratio = if self.total == 0 { 1.0 } else { state.completed as f64 / self.total as f64 };
        let filled = ((ratio * self.width as f64) as usize).min(self.width);

        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(self.width - filled));

        // Drawing is best effort; a closed diagnostic stream must not fail the run.
        let _ = write!(state.sink, "\r[{bar}] {}/{} ({:.2}%) ", state.completed, self.total, ratio * 100.0);

        if state.completed >= self.total {
            let _ = writeln!(state.sink);
            state.finished = true;
        }

        let _ = state.sink.flush();
        state.last_render = Some(Instant::now());
    }
}

impl<W: Write + Send> Progress for ProgressBar<W> {
    fn update(&self, completed: u64) {
        let mut state = self.state.lock();

        if state.finished {
            return;
        }

        state.completed = state.completed.max(completed.min(self.total));

        let done = state.completed >= self.total;
        let due = state.last_render.is_none_or(|last| last.elapsed() >= self.interval);

        if done || due {
            self.render(&mut state);
        }
    }

    fn interrupt(&self) {
        let mut state = self.state.lock();

        if state.finished || state.last_render.is_none() {
            return;
        }

        self.render(&mut state);
        let _ = writeln!(state.sink);
        let _ = state.sink.flush();
        state.finished = true;
    }
}

#[cfg(test)]
impl ProgressBar<Vec<u8>> {
    pub fn rendered(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().sink).into_owned()
    }
}

/// Animated `indicatif` bar with throughput and ETA.
pub struct Live {
    bar: indicatif::ProgressBar,
}

impl Live {
    /// # Errors
    ///
    /// Returns an error if the bar template is rejected.
    pub fn new(total: u64) -> Result<Self> {
        let bar = indicatif::ProgressBar::new(total);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})")
            .context("invalid progress template")?
            .progress_chars("●○ ");

        bar.set_style(style);

        Ok(Self { bar })
    }
}

impl Progress for Live {
    fn update(&self, completed: u64) {
        self.bar.set_position(completed);
        if self.bar.length().is_some_and(|total| completed >= total) && !self.bar.is_finished() {
            self.bar.finish();
        }
    }

    fn interrupt(&self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}
