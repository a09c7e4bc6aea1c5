//! Producer side: append retry events to the shared log, one line per event.
//!
//! Used from test hooks while the suite runs. Failures here must never fail a
//! test, so `append` swallows every error and only reports it at debug level.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::types::FlakyEvent;

/// Default location of the event log, relative to the build directory.
pub const DEFAULT_LOG_PATH: &str = "target/flaky/flaky.jsonl";

/// Serialized appender. Share one instance (e.g. behind an `Arc` or a
/// `static`) between all test threads.
#[derive(Debug)]
pub struct EventSink {
  path: PathBuf,
  lock: Mutex<()>,
}

impl EventSink {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Append one event as a single JSON line. Returns whether it was written.
  pub fn append(&self, event: &FlakyEvent) -> bool {
    // A poisoned lock only means another appender panicked mid-write.
    let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match self.try_append(event) {
      Ok(()) => true,
      Err(e) => {
        debug!(path = %self.path.display(), error = %e, "flaky event not logged");
        false
      }
    }
  }

  fn try_append(&self, event: &FlakyEvent) -> io::Result<()> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      fs::create_dir_all(dir)?;
    }
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    // Whole line in one write so other processes appending can't split it.
    file.write_all(&line)?;
    file.flush()
  }
}

impl Default for EventSink {
  fn default() -> Self {
    Self::new(DEFAULT_LOG_PATH)
  }
}

/// Per-test retry counter: hands out attempts `1..=max_retries`, then `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
  max_retries: u32,
  used: u32,
}

impl RetryBudget {
  pub const DEFAULT_MAX_RETRIES: u32 = 2;

  pub fn new(max_retries: u32) -> Self {
    Self {
      max_retries,
      used: 0,
    }
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  /// Consume one retry; the returned value is the attempt number to log.
  pub fn next_attempt(&mut self) -> Option<u32> {
    if self.used < self.max_retries {
      self.used += 1;
      Some(self.used)
    } else {
      None
    }
  }
}

impl Default for RetryBudget {
  fn default() -> Self {
    Self::new(Self::DEFAULT_MAX_RETRIES)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::thread;

  use crate::reader::EventReader;

  #[test]
  fn appends_one_line_per_event_and_creates_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target").join("flaky").join("flaky.jsonl");
    let sink = EventSink::new(&path);

    assert!(sink.append(&FlakyEvent::retry("com.T", "m", 1, 2)));
    assert!(sink.append(&FlakyEvent::retry("com.T", "m", 2, 2).with_error("boom", Some("at X".into()))));

    let raw = fs::read_to_string(&path).unwrap();
    assert_eq!(raw.lines().count(), 2);
    assert!(raw.ends_with('\n'));
    assert!(raw.contains("\"stackTrace\":\"at X\""));
  }

  #[test]
  fn concurrent_appends_never_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flaky.jsonl");
    let sink = Arc::new(EventSink::new(&path));

    let handles: Vec<_> = (0..8)
      .map(|t| {
        let sink = Arc::clone(&sink);
        thread::spawn(move || {
          for i in 0..50 {
            let event = FlakyEvent::new(format!("com.T{}", t), format!("m{}", i))
              .with_attempt(1)
              .with_error("x".repeat(512), None);
            sink.append(&event);
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }

    let file = fs::File::open(&path).unwrap();
    let mut reader = EventReader::new(io::BufReader::new(file), &path);
    let events = reader.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(events.len(), 400);
    assert!(reader.warnings().is_empty());
  }

  #[test]
  fn unwritable_path_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    // The log path is an existing directory, so opening it for append fails.
    let sink = EventSink::new(dir.path());
    assert!(!sink.append(&FlakyEvent::new("com.T", "m")));
  }

  #[test]
  fn retry_budget_counts_up_then_stops() {
    let mut budget = RetryBudget::default();
    assert_eq!(budget.next_attempt(), Some(1));
    assert_eq!(budget.next_attempt(), Some(2));
    assert_eq!(budget.next_attempt(), None);
    assert_eq!(budget.next_attempt(), None);
    assert_eq!(RetryBudget::new(0).next_attempt(), None);
  }
}
