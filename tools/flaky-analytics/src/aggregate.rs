//! Per-test folding of retry events: occurrence count, max attempt, last seen.

use std::collections::HashMap;

use crate::types::{Aggregate, FlakyEvent, TestKey};

/// Owns the `TestKey -> Aggregate` map for one analysis run.
#[derive(Debug, Default)]
pub struct Aggregator {
  groups: HashMap<TestKey, Aggregate>,
}

impl Aggregator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fold one event into its test's aggregate, creating it on first sight.
  pub fn record(&mut self, event: &FlakyEvent) {
    let key = event.key();
    let agg = self
      .groups
      .entry(key)
      .or_insert_with_key(|key| Aggregate::new(key.clone()));

    agg.occurrence_count += 1;
    agg.max_attempt = agg.max_attempt.max(event.attempt);
    // Log order, not chronological: timestamps are never compared.
    if let Some(ts) = &event.timestamp {
      agg.last_seen = Some(ts.clone());
    }
  }

  pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a FlakyEvent>) {
    for event in events {
      self.record(event);
    }
  }

  pub fn get(&self, key: &TestKey) -> Option<&Aggregate> {
    self.groups.get(key)
  }

  pub fn len(&self) -> usize {
    self.groups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }

  /// Release the aggregates, sorted by key.
  pub fn into_sorted(self) -> Vec<Aggregate> {
    let mut aggs: Vec<Aggregate> = self.groups.into_values().collect();
    aggs.sort_by(|a, b| a.key.cmp(&b.key));
    aggs
  }
}
