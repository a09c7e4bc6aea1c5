//! Flaky test analytics — deterministic, rule-based.
//!
//! Reads the retry event log written during a test run, folds events per
//! test (`class#method`), classifies each test with ordered heuristic rules,
//! and writes JSON, CSV, HTML and plain-text reports.
//!
//! No DB, no network; one batch pass over a local file.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod sink;
pub mod types;

pub use aggregate::Aggregator;
pub use config::{Config, Rule};
pub use error::{AnalyticsError, EmitError, LineWarning};
pub use pipeline::{run, RunOptions, RunOutcome, RunSummary};
pub use report::ReportFormat;
pub use sink::{EventSink, RetryBudget};
pub use types::{Aggregate, FlakyEvent, Recommendation, RiskLevel, TestKey};
