//! Core types for flaky analytics (JSON contracts + internal models).

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — one log line per retry)
// ---------------------------------------------------------------------------

/// One retry occurrence as appended by the test runner.
///
/// Only `testClass` and `testMethod` are required. Every field the analyzer
/// does not use (`status`, `errorMessage`, `stackTrace`, ...) lands in `extra`
/// untouched, so it is neither validated nor dropped when the event is written
/// back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakyEvent {
  pub test_class: String,
  pub test_method: String,
  /// Missing or `null` counts as 0; integral floats (`2.0`) are accepted.
  #[serde(default, deserialize_with = "lenient_attempt")]
  pub attempt: u32,
  /// Opaque; carried through, never parsed. Non-string scalars keep their JSON text.
  #[serde(
    default,
    deserialize_with = "opaque_timestamp",
    skip_serializing_if = "Option::is_none"
  )]
  pub timestamp: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl FlakyEvent {
  pub fn new(test_class: impl Into<String>, test_method: impl Into<String>) -> Self {
    Self {
      test_class: test_class.into(),
      test_method: test_method.into(),
      attempt: 0,
      timestamp: None,
      extra: Map::new(),
    }
  }

  /// Producer-side event for a retry about to happen, stamped with the current time.
  pub fn retry(
    test_class: impl Into<String>,
    test_method: impl Into<String>,
    attempt: u32,
    max_retries: u32,
  ) -> Self {
    let mut event = Self::new(test_class, test_method)
      .with_attempt(attempt)
      .with_timestamp(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    event.extra.insert("maxRetryCount".into(), Value::from(max_retries));
    event.extra.insert("status".into(), Value::from("RETRY"));
    event
  }

  pub fn with_attempt(mut self, attempt: u32) -> Self {
    self.attempt = attempt;
    self
  }

  pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
    self.timestamp = Some(timestamp.into());
    self
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.extra.insert("status".into(), Value::from(status.into()));
    self
  }

  /// Attach failure detail from the attempt that triggered the retry.
  pub fn with_error(mut self, message: impl Into<String>, stack_trace: Option<String>) -> Self {
    self.extra.insert("errorMessage".into(), Value::from(message.into()));
    if let Some(trace) = stack_trace {
      self.extra.insert("stackTrace".into(), Value::from(trace));
    }
    self
  }

  pub fn key(&self) -> TestKey {
    TestKey::new(&self.test_class, &self.test_method)
  }
}

fn lenient_attempt<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
  let n = match Option::<Value>::deserialize(d)? {
    None | Some(Value::Null) => return Ok(0),
    Some(Value::Number(n)) => n,
    Some(other) => {
      return Err(de::Error::custom(format!("attempt: expected integer, got {}", other)));
    }
  };
  n.as_u64()
    .or_else(|| {
      n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
        .map(|f| f as u64)
    })
    .and_then(|v| u32::try_from(v).ok())
    .ok_or_else(|| {
      de::Error::custom(format!("attempt: expected non-negative integer, got {}", n))
    })
}

fn opaque_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  match Option::<Value>::deserialize(d)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
    Some(_) => Err(de::Error::custom("timestamp: expected a scalar")),
  }
}

// ---------------------------------------------------------------------------
// Test identity
// ---------------------------------------------------------------------------

/// `class#method`. Opaque apart from the separator used for display.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestKey(String);

impl TestKey {
  pub const SEPARATOR: char = '#';

  pub fn new(test_class: &str, test_method: &str) -> Self {
    Self(format!("{}{}{}", test_class, Self::SEPARATOR, test_method))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Split back into `(class, method)` at the first separator.
  pub fn parts(&self) -> (&str, &str) {
    self.0.split_once(Self::SEPARATOR).unwrap_or((self.0.as_str(), ""))
  }
}

impl fmt::Display for TestKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ---------------------------------------------------------------------------
// Aggregate (per-key running stats, in-memory for one run)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
  pub key: TestKey,
  pub occurrence_count: u64,
  pub max_attempt: u32,
  /// Timestamp of the last event (in log order) that carried one.
  pub last_seen: Option<String>,
}

impl Aggregate {
  pub fn new(key: TestKey) -> Self {
    Self {
      key,
      occurrence_count: 0,
      max_attempt: 0,
      last_seen: None,
    }
  }
}

// ---------------------------------------------------------------------------
// Risk level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
  HighRisk,
  LikelyFlaky,
  Transient,
  Monitor,
}

impl RiskLevel {
  pub const ALL: [RiskLevel; 4] = [
    RiskLevel::HighRisk,
    RiskLevel::LikelyFlaky,
    RiskLevel::Transient,
    RiskLevel::Monitor,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::HighRisk => "HIGH_RISK",
      Self::LikelyFlaky => "LIKELY_FLAKY",
      Self::Transient => "TRANSIENT",
      Self::Monitor => "MONITOR",
    }
  }

  /// Guidance text shown to report readers. Wording is part of the report contract.
  pub fn guidance(self) -> &'static str {
    match self {
      Self::HighRisk => {
        "Quarantine candidate; open investigation; capture full diagnostics on failure."
      }
      Self::LikelyFlaky => {
        "Mark flaky; consider quarantine or investigation; add logging/targeted retries."
      }
      Self::Transient => {
        "Single occurrence but needed a retry; investigate intermittent timing/resource causes."
      }
      Self::Monitor => "Low frequency; keep observing.",
    }
  }

  pub fn css_class(self) -> &'static str {
    match self {
      Self::HighRisk => "high-risk",
      Self::LikelyFlaky => "likely-flaky",
      Self::Transient => "transient",
      Self::Monitor => "monitor",
    }
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what the reports carry)
// ---------------------------------------------------------------------------

/// Classified result for one test; the only input every report consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
  pub test: String,
  pub clazz: String,
  pub method: String,
  pub occurrences: u64,
  pub max_attempt: u32,
  pub last_seen: String,
  pub recommendation: String,
  #[serde(skip)]
  pub level: RiskLevel,
}

impl Recommendation {
  pub fn new(aggregate: &Aggregate, level: RiskLevel) -> Self {
    let (clazz, method) = aggregate.key.parts();
    Self {
      test: aggregate.key.as_str().to_string(),
      clazz: clazz.to_string(),
      method: method.to_string(),
      occurrences: aggregate.occurrence_count,
      max_attempt: aggregate.max_attempt,
      last_seen: aggregate.last_seen.clone().unwrap_or_default(),
      recommendation: level.guidance().to_string(),
      level,
    }
  }
}
