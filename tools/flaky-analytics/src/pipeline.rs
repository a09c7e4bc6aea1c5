//! One-shot batch run: read log, aggregate, classify, emit every report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::classify;
use crate::config::Config;
use crate::error::{AnalyticsError, EmitError, LineWarning};
use crate::reader;
use crate::report;
use crate::sink::DEFAULT_LOG_PATH;
use crate::types::{Recommendation, RiskLevel};

pub const DEFAULT_OUT_DIR: &str = "target/flaky";

#[derive(Debug, Clone)]
pub struct RunOptions {
  pub log_path: PathBuf,
  pub out_dir: PathBuf,
  pub config: Config,
  /// Stamped into the HTML report.
  pub generated_at: DateTime<Utc>,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      log_path: PathBuf::from(DEFAULT_LOG_PATH),
      out_dir: PathBuf::from(DEFAULT_OUT_DIR),
      config: Config::default(),
      generated_at: Utc::now(),
    }
  }
}

#[derive(Debug)]
pub enum RunOutcome {
  /// The log does not exist; nothing was written.
  NoLog { path: PathBuf },
  Completed(RunSummary),
}

#[derive(Debug)]
pub struct RunSummary {
  pub recommendations: Vec<Recommendation>,
  pub warnings: Vec<LineWarning>,
  pub written: Vec<PathBuf>,
  pub failures: Vec<EmitError>,
}

impl RunSummary {
  /// True when every report was written.
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  /// Number of tests per risk level (levels with no tests included as 0).
  pub fn counts(&self) -> BTreeMap<RiskLevel, usize> {
    let mut counts: BTreeMap<RiskLevel, usize> = RiskLevel::ALL.iter().map(|&l| (l, 0)).collect();
    for r in &self.recommendations {
      *counts.entry(r.level).or_insert(0) += 1;
    }
    counts
  }
}

pub fn run(opts: &RunOptions) -> Result<RunOutcome, AnalyticsError> {
  let mut events = match reader::open(&opts.log_path)? {
    Some(r) => r,
    None => {
      info!(path = %opts.log_path.display(), "no flaky event log found");
      return Ok(RunOutcome::NoLog {
        path: opts.log_path.clone(),
      });
    }
  };

  let mut aggregator = Aggregator::new();
  for event in events.by_ref() {
    aggregator.record(&event?);
  }
  let warnings = events.into_warnings();
  if !warnings.is_empty() {
    warn!(skipped = warnings.len(), "malformed lines skipped");
  }
  info!(tests = aggregator.len(), "aggregated flaky events");

  let recommendations = classify::classify_all(&opts.config, &aggregator.into_sorted());
  let emitted = report::emit_all(&opts.out_dir, &recommendations, &opts.generated_at)?;

  Ok(RunOutcome::Completed(RunSummary {
    recommendations,
    warnings,
    written: emitted.written,
    failures: emitted.failures,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn opts(dir: &std::path::Path) -> RunOptions {
    RunOptions {
      log_path: dir.join("flaky.jsonl"),
      out_dir: dir.join("out"),
      ..RunOptions::default()
    }
  }

  #[test]
  fn missing_log_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts(dir.path());
    let outcome = run(&opts).unwrap();
    assert!(matches!(outcome, RunOutcome::NoLog { .. }));
    assert!(!opts.out_dir.exists());
  }

  #[test]
  fn counts_cover_every_level() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts(dir.path());
    fs::write(
      &opts.log_path,
      "{\"testClass\":\"com.T\",\"testMethod\":\"a\",\"attempt\":3}\n\
       {\"testClass\":\"com.T\",\"testMethod\":\"b\"}\n",
    )
    .unwrap();

    let summary = match run(&opts).unwrap() {
      RunOutcome::Completed(s) => s,
      other => panic!("unexpected outcome: {:?}", other),
    };
    let counts = summary.counts();
    assert_eq!(counts.len(), 4);
    assert_eq!(counts[&RiskLevel::HighRisk], 1);
    assert_eq!(counts[&RiskLevel::Monitor], 1);
    assert_eq!(counts[&RiskLevel::LikelyFlaky], 0);
  }

  #[test]
  fn custom_rules_flow_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = opts(dir.path());
    opts.config = Config::from_toml_str(
      r#"
        fallback = "TRANSIENT"
        [[rules]]
        level = "HIGH_RISK"
        occurrences_at_least = 100
      "#,
    )
    .unwrap();
    fs::write(&opts.log_path, "{\"testClass\":\"com.T\",\"testMethod\":\"a\",\"attempt\":3}\n").unwrap();

    let RunOutcome::Completed(summary) = run(&opts).unwrap() else {
      panic!("expected a completed run");
    };
    assert_eq!(summary.recommendations[0].level, RiskLevel::Transient);
  }
}
