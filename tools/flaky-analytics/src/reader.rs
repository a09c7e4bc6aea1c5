//! Event log reader: one JSON object per line, malformed lines skipped with a warning.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AnalyticsError, LineWarning};
use crate::types::FlakyEvent;

/// Single-pass iterator over the events in a log.
///
/// Blank lines are skipped silently. Lines that are not a valid event object
/// (including invalid UTF-8) are skipped and recorded in
/// [`EventReader::warnings`]. An I/O failure ends the iteration with one `Err` item.
pub struct EventReader<R> {
  lines: io::Split<R>,
  path: PathBuf,
  line_no: usize,
  warnings: Vec<LineWarning>,
  failed: bool,
}

/// Open `path` for reading. Returns `Ok(None)` when the file does not exist.
pub fn open(path: &Path) -> Result<Option<EventReader<BufReader<File>>>, AnalyticsError> {
  match File::open(path) {
    Ok(file) => Ok(Some(EventReader::new(BufReader::new(file), path))),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(AnalyticsError::read_log(path, e)),
  }
}

impl<R: BufRead> EventReader<R> {
  pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
    Self {
      lines: reader.split(b'\n'),
      path: path.into(),
      line_no: 0,
      warnings: Vec::new(),
      failed: false,
    }
  }

  pub fn warnings(&self) -> &[LineWarning] {
    &self.warnings
  }

  pub fn into_warnings(self) -> Vec<LineWarning> {
    self.warnings
  }

  fn skip(&mut self, raw: &str, reason: String) {
    let warning = LineWarning::new(self.line_no, raw, reason);
    warn!(
      path = %self.path.display(),
      line = warning.line,
      excerpt = %warning.excerpt,
      "skipping malformed event line: {}",
      warning.reason
    );
    self.warnings.push(warning);
  }
}

impl<R: BufRead> Iterator for EventReader<R> {
  type Item = Result<FlakyEvent, AnalyticsError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed {
      return None;
    }
    loop {
      let bytes = match self.lines.next()? {
        Ok(b) => b,
        Err(e) => {
          self.failed = true;
          return Some(Err(AnalyticsError::read_log(&self.path, e)));
        }
      };
      self.line_no += 1;

      let line = match String::from_utf8(bytes) {
        Ok(l) => l,
        Err(e) => {
          let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
          self.skip(&lossy, format!("invalid utf-8: {}", e.utf8_error()));
          continue;
        }
      };

      let mut trimmed = line.trim();
      if self.line_no == 1 {
        trimmed = trimmed.trim_start_matches('\u{feff}');
      }
      if trimmed.is_empty() {
        continue;
      }

      match serde_json::from_str::<FlakyEvent>(trimmed) {
        Ok(event) => return Some(Ok(event)),
        Err(e) => self.skip(trimmed, e.to_string()),
      }
    }
  }
}
