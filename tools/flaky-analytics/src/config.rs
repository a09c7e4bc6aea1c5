//! Classifier configuration with defaults matching the built-in rule table.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AnalyticsError;
use crate::types::RiskLevel;

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Match {
  #[default]
  Any,
  All,
}

/// One classification rule. Absent conditions are not evaluated; a rule with
/// no conditions never matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
  pub level: RiskLevel,
  #[serde(default, rename = "match")]
  pub mode: Match,
  #[serde(default)]
  pub occurrences_at_least: Option<u64>,
  #[serde(default)]
  pub occurrences_exactly: Option<u64>,
  #[serde(default)]
  pub max_attempt_at_least: Option<u32>,
}

impl Rule {
  pub fn any(level: RiskLevel) -> Self {
    Self {
      level,
      mode: Match::Any,
      occurrences_at_least: None,
      occurrences_exactly: None,
      max_attempt_at_least: None,
    }
  }

  pub fn all(level: RiskLevel) -> Self {
    Self {
      mode: Match::All,
      ..Self::any(level)
    }
  }

  pub fn occurrences_at_least(mut self, n: u64) -> Self {
    self.occurrences_at_least = Some(n);
    self
  }

  pub fn occurrences_exactly(mut self, n: u64) -> Self {
    self.occurrences_exactly = Some(n);
    self
  }

  pub fn max_attempt_at_least(mut self, n: u32) -> Self {
    self.max_attempt_at_least = Some(n);
    self
  }

  pub fn matches(&self, occurrences: u64, max_attempt: u32) -> bool {
    let checks = [
      self.occurrences_at_least.map(|n| occurrences >= n),
      self.occurrences_exactly.map(|n| occurrences == n),
      self.max_attempt_at_least.map(|n| max_attempt >= n),
    ];
    let mut present = checks.iter().flatten().peekable();
    if present.peek().is_none() {
      return false;
    }
    match self.mode {
      Match::Any => present.any(|&hit| hit),
      Match::All => present.all(|&hit| hit),
    }
  }
}

/// Ordered rule list (first match wins) plus the level used when nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  pub rules: Vec<Rule>,
  #[serde(default = "default_fallback")]
  pub fallback: RiskLevel,
}

fn default_fallback() -> RiskLevel {
  RiskLevel::Monitor
}

impl Default for Config {
  fn default() -> Self {
    Self {
      rules: vec![
        Rule::any(RiskLevel::HighRisk)
          .occurrences_at_least(5)
          .max_attempt_at_least(3),
        Rule::any(RiskLevel::LikelyFlaky)
          .occurrences_at_least(3)
          .max_attempt_at_least(2),
        Rule::all(RiskLevel::Transient)
          .occurrences_exactly(1)
          .max_attempt_at_least(2),
      ],
      fallback: default_fallback(),
    }
  }
}

impl Config {
  /// Parse a TOML rule file:
  ///
  /// ```toml
  /// fallback = "MONITOR"
  ///
  /// [[rules]]
  /// level = "HIGH_RISK"
  /// match = "any"
  /// occurrences_at_least = 5
  /// max_attempt_at_least = 3
  /// ```
  pub fn from_toml_str(raw: &str) -> Result<Self, String> {
    let config: Config = toml::from_str(raw).map_err(|e| e.to_string())?;
    if config.rules.is_empty() {
      return Err("at least one [[rules]] entry is required".into());
    }
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, AnalyticsError> {
    let raw = fs::read_to_string(path).map_err(|e| AnalyticsError::config(path, e.to_string()))?;
    Self::from_toml_str(&raw).map_err(|reason| AnalyticsError::config(path, reason))
  }
}
