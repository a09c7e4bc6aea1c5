//! Plain-text report: one block per test.

use std::io::{self, Write};

use crate::types::Recommendation;

pub fn write<W: Write>(out: &mut W, recs: &[Recommendation]) -> io::Result<()> {
  for r in recs {
    writeln!(out, "Test: {}", r.test)?;
    writeln!(out, "  Recommendation: {}", r.recommendation)?;
    writeln!(
      out,
      "  Occurrences: {}, MaxAttempt: {}, LastSeen: {}",
      r.occurrences, r.max_attempt, r.last_seen
    )?;
    writeln!(out)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::fixtures::rec;
  use crate::types::RiskLevel;
  use pretty_assertions::assert_eq;

  #[test]
  fn block_per_recommendation() {
    let recs = vec![
      rec("com.A", "x", 1, 0, None, RiskLevel::Monitor),
      rec("com.B", "y", 3, 3, Some("2025-01-15T10:30:00Z"), RiskLevel::HighRisk),
    ];
    let mut buf = Vec::new();
    write(&mut buf, &recs).unwrap();
    let expected = format!(
      "Test: com.A#x\n  Recommendation: {}\n  Occurrences: 1, MaxAttempt: 0, LastSeen: \n\n\
       Test: com.B#y\n  Recommendation: {}\n  Occurrences: 3, MaxAttempt: 3, LastSeen: 2025-01-15T10:30:00Z\n\n",
      RiskLevel::Monitor.guidance(),
      RiskLevel::HighRisk.guidance(),
    );
    assert_eq!(String::from_utf8(buf).unwrap(), expected);
  }

  #[test]
  fn no_recommendations_writes_nothing() {
    let mut buf = Vec::new();
    write(&mut buf, &[]).unwrap();
    assert!(buf.is_empty());
  }
}
