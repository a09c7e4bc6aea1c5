//! Structured-data report: pretty-printed JSON array.

use std::io::{self, Write};

use crate::types::Recommendation;

pub fn write<W: Write>(out: &mut W, recs: &[Recommendation]) -> io::Result<()> {
  serde_json::to_writer_pretty(&mut *out, recs)?;
  writeln!(out)
}
