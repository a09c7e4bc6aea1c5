//! Hypertext report: one self-contained page with a table row per test.

use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::Recommendation;

pub const TITLE: &str = "Flaky Test Report";

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
th{background:#f0f0f0}\
tr.high-risk td{background:#fde2e1}\
tr.likely-flaky td{background:#fff4d6}\
tr.transient td{background:#e8f1fd}";

pub fn write<W: Write>(
  out: &mut W,
  recs: &[Recommendation],
  generated_at: &DateTime<Utc>,
) -> io::Result<()> {
  writeln!(out, "<!DOCTYPE html>")?;
  writeln!(out, "<html lang=\"en\">")?;
  writeln!(out, "<head>")?;
  writeln!(out, "<meta charset=\"utf-8\">")?;
  writeln!(out, "<title>{}</title>", TITLE)?;
  writeln!(out, "<style>{}</style>", STYLE)?;
  writeln!(out, "</head>")?;
  writeln!(out, "<body>")?;
  writeln!(out, "<h1>{}</h1>", TITLE)?;
  writeln!(
    out,
    "<p>Generated: {}</p>",
    escape(&generated_at.to_rfc3339_opts(SecondsFormat::Secs, true))
  )?;
  writeln!(out, "<table>")?;
  writeln!(
    out,
    "<tr><th>Test</th><th>Class</th><th>Method</th><th>Occurrences</th>\
     <th>Max Attempt</th><th>Last Seen</th><th>Recommendation</th></tr>"
  )?;
  for r in recs {
    writeln!(
      out,
      "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
      r.level.css_class(),
      escape(&r.test),
      escape(&r.clazz),
      escape(&r.method),
      r.occurrences,
      r.max_attempt,
      escape(&r.last_seen),
      escape(&r.recommendation),
    )?;
  }
  writeln!(out, "</table>")?;
  writeln!(out, "</body>")?;
  writeln!(out, "</html>")
}

/// Escape the five reserved markup characters.
pub fn escape(s: &str) -> String {
  let mut escaped = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::fixtures::{generated_at, rec};
  use crate::types::RiskLevel;

  fn render(recs: &[Recommendation]) -> String {
    let mut buf = Vec::new();
    write(&mut buf, recs, &generated_at()).unwrap();
    String::from_utf8(buf).unwrap()
  }

  #[test]
  fn escapes_reserved_characters() {
    assert_eq!(
      escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
      "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
    );
    assert_eq!(escape("plain/text"), "plain/text");
  }

  #[test]
  fn document_has_title_timestamp_and_rows() {
    let html = render(&[
      rec("com.A", "x", 1, 0, None, RiskLevel::Monitor),
      rec("com.B", "y", 5, 1, Some("2025-01-15T10:30:00Z"), RiskLevel::HighRisk),
    ]);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Flaky Test Report</title>"));
    assert!(html.contains("<p>Generated: 2025-01-15T12:00:00Z</p>"));
    // Header row + one per recommendation.
    assert_eq!(html.matches("<tr").count(), 3);
    assert!(html.contains("<tr class=\"high-risk\"><td>com.B#y</td>"));
    assert!(html.trim_end().ends_with("</html>"));
  }

  #[test]
  fn test_names_are_escaped_in_cells() {
    let method = "<script>alert('x')</script>";
    let html = render(&[rec("com.A", method, 1, 0, None, RiskLevel::Monitor)]);
    assert!(!html.contains("<script>"));
    assert!(html.contains("<td>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</td>"));
  }
}
