//! Binary entrypoint.
//!
//! `analyze` runs the batch pipeline over the event log and writes the four
//! reports. `record` appends one retry event, for runners that shell out.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flaky_analytics::pipeline::DEFAULT_OUT_DIR;
use flaky_analytics::sink::DEFAULT_LOG_PATH;
use flaky_analytics::{Config, EventSink, FlakyEvent, RunOptions, RunOutcome, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "flaky-analytics")]
#[command(about = "Flaky test analytics from retry event logs", long_about = None)]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Debug-level diagnostics on stderr
  #[arg(short, long, global = true, conflicts_with = "quiet")]
  verbose: bool,

  /// Only warnings and errors on stderr
  #[arg(short, long, global = true)]
  quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Aggregate the event log and write all reports
  Analyze(AnalyzeArgs),
  /// Append one retry event to the event log
  Record(RecordArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
  /// Event log (JSON lines)
  #[arg(long, env = "FLAKY_LOG", default_value = DEFAULT_LOG_PATH)]
  log: PathBuf,

  /// Directory for the reports (created if missing)
  #[arg(long, env = "FLAKY_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
  out_dir: PathBuf,

  /// TOML file with classification rules (defaults to the built-in rules)
  #[arg(long)]
  config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RecordArgs {
  /// Fully-qualified test class
  #[arg(long = "class")]
  test_class: String,

  /// Test method
  #[arg(long = "method")]
  test_method: String,

  /// Retry attempt number
  #[arg(long, default_value_t = 1)]
  attempt: u32,

  /// Retry limit configured in the runner
  #[arg(long, default_value_t = flaky_analytics::RetryBudget::DEFAULT_MAX_RETRIES)]
  max_retries: u32,

  /// Status label stored with the event
  #[arg(long)]
  status: Option<String>,

  /// Failure message of the attempt that triggered the retry
  #[arg(long)]
  error_message: Option<String>,

  /// Event log (JSON lines)
  #[arg(long, env = "FLAKY_LOG", default_value = DEFAULT_LOG_PATH)]
  log: PathBuf,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose, cli.quiet);

  match cli.command {
    Commands::Analyze(args) => match analyze(args) {
      Ok(code) => code,
      Err(e) => {
        eprintln!("flaky-analytics: {:#}", e);
        ExitCode::FAILURE
      }
    },
    Commands::Record(args) => {
      record(args);
      // Logging failures must never fail the calling test.
      ExitCode::SUCCESS
    }
  }
}

fn init_tracing(verbose: bool, quiet: bool) {
  let default_level = if verbose {
    "debug"
  } else if quiet {
    "warn"
  } else {
    "info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

fn analyze(args: AnalyzeArgs) -> anyhow::Result<ExitCode> {
  let config = match &args.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  let opts = RunOptions {
    log_path: args.log,
    out_dir: args.out_dir,
    config,
    generated_at: Utc::now(),
  };

  let outcome = flaky_analytics::run(&opts)?;
  match &outcome {
    RunOutcome::NoLog { path } => {
      println!("No flaky log found at {}; nothing to analyze.", path.display());
    }
    RunOutcome::Completed(summary) => {
      print_summary(summary);
      if !summary.is_success() {
        eprintln!(
          "flaky-analytics: {} of {} report(s) failed to write",
          summary.failures.len(),
          summary.failures.len() + summary.written.len()
        );
      }
    }
  }
  Ok(ExitCode::from(exit_status(&outcome)))
}

/// 0 when there was nothing to do or every report was written, 1 otherwise.
fn exit_status(outcome: &RunOutcome) -> u8 {
  match outcome {
    RunOutcome::NoLog { .. } => 0,
    RunOutcome::Completed(summary) if summary.is_success() => 0,
    RunOutcome::Completed(_) => 1,
  }
}

fn print_summary(summary: &RunSummary) {
  println!("Analyzed {} flaky test(s).", summary.recommendations.len());
  for (level, count) in summary.counts() {
    println!("  {:<13} {}", level.label(), count);
  }
  if !summary.warnings.is_empty() {
    println!("Skipped {} malformed line(s):", summary.warnings.len());
    for w in &summary.warnings {
      println!("  {}", w);
    }
  }
  for path in &summary.written {
    println!("Wrote {}", path.display());
  }
}

fn record(args: RecordArgs) {
  let mut event = FlakyEvent::retry(args.test_class, args.test_method, args.attempt, args.max_retries);
  if let Some(status) = args.status {
    event = event.with_status(status);
  }
  if let Some(message) = args.error_message {
    event = event.with_error(message, None);
  }
  EventSink::new(args.log).append(&event);
}
