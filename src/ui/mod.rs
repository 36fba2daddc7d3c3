//! User interface components for the terminal.
//!
//! # Modules
//!
//! - [`display`]: Banner and summary lines
//! - [`progress`]: Progress trackers fed by the writer

pub mod display;
pub mod progress;
