//! Tabular report: comma-separated, quoted only where a value needs it.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::types::Recommendation;

pub const HEADER: &str = "test,clazz,method,occurrences,maxAttempt,lastSeen,recommendation";

pub fn write<W: Write>(out: &mut W, recs: &[Recommendation]) -> io::Result<()> {
  writeln!(out, "{}", HEADER)?;
  for r in recs {
    writeln!(
      out,
      "{},{},{},{},{},{},{}",
      escape(&r.test),
      escape(&r.clazz),
      escape(&r.method),
      r.occurrences,
      r.max_attempt,
      escape(&r.last_seen),
      escape(&r.recommendation),
    )?;
  }
  Ok(())
}

/// Wrap in double quotes (doubling inner quotes) when the value contains a
/// comma, quote, or line break.
pub fn escape(field: &str) -> Cow<'_, str> {
  if field.contains([',', '"', '\n', '\r']) {
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(field)
  }
}
