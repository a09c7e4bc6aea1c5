//! Ordered, first-match-wins risk classification.

use crate::config::Config;
use crate::types::{Aggregate, Recommendation, RiskLevel};

/// Risk level for `(occurrences, max_attempt)`. Pure: same input, same level.
pub fn risk_level(config: &Config, occurrences: u64, max_attempt: u32) -> RiskLevel {
  config
    .rules
    .iter()
    .find(|rule| rule.matches(occurrences, max_attempt))
    .map(|rule| rule.level)
    .unwrap_or(config.fallback)
}

pub fn classify(config: &Config, aggregate: &Aggregate) -> Recommendation {
  let level = risk_level(config, aggregate.occurrence_count, aggregate.max_attempt);
  Recommendation::new(aggregate, level)
}

/// Classify every aggregate, ordered by test key.
pub fn classify_all(config: &Config, aggregates: &[Aggregate]) -> Vec<Recommendation> {
  let mut recs: Vec<Recommendation> = aggregates.iter().map(|a| classify(config, a)).collect();
  recs.sort_by(|a, b| a.test.cmp(&b.test));
  recs
}
