//! Progress indicators for long-running operations
//!
//! Uses `linya` bars drawn on stderr, so stdout stays clean for `--json`.

use linya::{Bar, Progress};

/// Progress bar for tag application on a single build
pub struct TagProgress {
  progress: Progress,
  bar: Bar,
}

impl TagProgress {
  /// Create a new progress bar with `total` steps
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
