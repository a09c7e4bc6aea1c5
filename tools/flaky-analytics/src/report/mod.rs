//! Report emitters. Each format writes the same ordered recommendations to its
//! own file; one failing format never stops the others.

pub mod csv;
pub mod html;
pub mod json;
pub mod text;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::error::{AnalyticsError, EmitError};
use crate::types::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  Json,
  Csv,
  Html,
  Text,
}

impl ReportFormat {
  pub const ALL: [ReportFormat; 4] = [
    ReportFormat::Json,
    ReportFormat::Csv,
    ReportFormat::Html,
    ReportFormat::Text,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Json => "json",
      Self::Csv => "csv",
      Self::Html => "html",
      Self::Text => "text",
    }
  }

  pub fn file_name(self) -> &'static str {
    match self {
      Self::Json => "flaky-summary.json",
      Self::Csv => "flaky-summary.csv",
      Self::Html => "flaky-report.html",
      Self::Text => "flaky-recommendations.txt",
    }
  }

  pub fn write_to<W: Write>(
    self,
    out: &mut W,
    recs: &[Recommendation],
    generated_at: &DateTime<Utc>,
  ) -> io::Result<()> {
    match self {
      Self::Json => json::write(out, recs),
      Self::Csv => csv::write(out, recs),
      Self::Html => html::write(out, recs, generated_at),
      Self::Text => text::write(out, recs),
    }
  }
}

/// What `emit_all` managed to write.
#[derive(Debug, Default)]
pub struct EmitReport {
  pub written: Vec<PathBuf>,
  pub failures: Vec<EmitError>,
}

impl EmitReport {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Create `dir` (and parents), then write every format into it.
///
/// Directory creation failure is fatal; per-format failures are collected.
pub fn emit_all(
  dir: &Path,
  recs: &[Recommendation],
  generated_at: &DateTime<Utc>,
) -> Result<EmitReport, AnalyticsError> {
  fs::create_dir_all(dir).map_err(|source| AnalyticsError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut report = EmitReport::default();
  for format in ReportFormat::ALL {
    let path = dir.join(format.file_name());
    match write_file(&path, format, recs, generated_at) {
      Ok(()) => {
        debug!(format = format.name(), path = %path.display(), "report written");
        report.written.push(path);
      }
      Err(source) => {
        let err = EmitError {
          format: format.name(),
          path,
          source,
        };
        error!("{}", err);
        report.failures.push(err);
      }
    }
  }
  Ok(report)
}

fn write_file(
  path: &Path,
  format: ReportFormat,
  recs: &[Recommendation],
  generated_at: &DateTime<Utc>,
) -> io::Result<()> {
  let mut out = BufWriter::new(File::create(path)?);
  format.write_to(&mut out, recs, generated_at)?;
  out.flush()
}

#[cfg(test)]
pub(crate) mod fixtures {
  use chrono::{DateTime, TimeZone, Utc};

  use crate::types::{Aggregate, Recommendation, RiskLevel, TestKey};

  pub fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
  }

  pub fn rec(
    class: &str,
    method: &str,
    occurrences: u64,
    max_attempt: u32,
    last_seen: Option<&str>,
    level: RiskLevel,
  ) -> Recommendation {
    let agg = Aggregate {
      key: TestKey::new(class, method),
      occurrence_count: occurrences,
      max_attempt,
      last_seen: last_seen.map(str::to_string),
    };
    Recommendation::new(&agg, level)
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures::{generated_at, rec};
  use super::*;
  use crate::types::RiskLevel;

  #[test]
  fn emit_all_writes_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("reports");
    let recs = vec![rec("com.T", "m", 3, 3, Some("2025-01-15T10:30:00Z"), RiskLevel::HighRisk)];

    let report = emit_all(&out, &recs, &generated_at()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.written.len(), 4);
    for format in ReportFormat::ALL {
      assert!(out.join(format.file_name()).is_file(), "{} missing", format.name());
    }
  }

  #[test]
  fn one_failing_format_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the CSV file name makes File::create fail.
    fs::create_dir(dir.path().join(ReportFormat::Csv.file_name())).unwrap();

    let report = emit_all(dir.path(), &[], &generated_at()).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].format, "csv");
    assert_eq!(report.written.len(), 3);
    assert!(dir.path().join(ReportFormat::Text.file_name()).is_file());
  }

  #[test]
  fn directory_creation_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").unwrap();

    let err = emit_all(&blocker.join("reports"), &[], &generated_at()).unwrap_err();
    assert!(matches!(err, AnalyticsError::CreateDir { .. }));
  }
}
