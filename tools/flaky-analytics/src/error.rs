//! Structured error types for flaky analytics.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Run-level failures. A missing log is not one of these: see `RunOutcome::NoLog`.
#[derive(Debug, Error)]
pub enum AnalyticsError {
  #[error("cannot read event log {}: {source}", .path.display())]
  ReadLog { path: PathBuf, source: io::Error },

  #[error("cannot create output directory {}: {source}", .path.display())]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("config {}: {reason}", .path.display())]
  Config { path: PathBuf, reason: String },
}

impl AnalyticsError {
  pub fn read_log(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::ReadLog {
      path: path.into(),
      source,
    }
  }

  pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    Self::Config {
      path: path.into(),
      reason: reason.into(),
    }
  }
}

/// One report that could not be written. Other reports are unaffected.
#[derive(Debug, Error)]
#[error("{format} report {}: {source}", .path.display())]
pub struct EmitError {
  pub format: &'static str,
  pub path: PathBuf,
  pub source: io::Error,
}

/// A log line that was skipped because it is not a valid event object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWarning {
  /// 1-based line number in the log.
  pub line: usize,
  pub excerpt: String,
  pub reason: String,
}

impl LineWarning {
  pub const EXCERPT_CHARS: usize = 80;

  pub fn new(line: usize, raw: &str, reason: impl Into<String>) -> Self {
    Self {
      line,
      excerpt: excerpt(raw, Self::EXCERPT_CHARS),
      reason: reason.into(),
    }
  }
}

impl fmt::Display for LineWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "line {}: {} ({})", self.line, self.reason, self.excerpt)
  }
}

/// Trimmed, truncated on a char boundary, `...` appended when cut.
fn excerpt(raw: &str, max_chars: usize) -> String {
  let trimmed = raw.trim();
  match trimmed.char_indices().nth(max_chars) {
    Some((idx, _)) => format!("{}...", &trimmed[..idx]),
    None => trimmed.to_string(),
  }
}
