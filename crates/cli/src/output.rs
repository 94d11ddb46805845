//! Rendering of `init` outcomes.
//!
//! Results go to stdout; notes, warnings and errors go to stderr so that
//! `-o json` output stays machine readable.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use serde_json::Value;

use devinit_lib::init::{BackendKind, Cleanup, InitFailure, InitResult};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Severity of a one-line notice on stderr.
#[derive(Debug, Clone, Copy)]
pub enum Notice {
  Error,
  Warning,
  Info,
}

impl Notice {
  fn symbol(self) -> &'static str {
    match self {
      Notice::Error => "✗",
      Notice::Warning => "⚠",
      Notice::Info => "•",
    }
  }
}

pub fn notice(level: Notice, message: &str) {
  let symbol = level.symbol();
  match level {
    Notice::Error => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.red()),
      message.if_supports_color(Stream::Stderr, |s| s.red())
    ),
    Notice::Warning => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.yellow()),
      message.if_supports_color(Stream::Stderr, |s| s.yellow())
    ),
    Notice::Info => eprintln!("{} {}", symbol.if_supports_color(Stream::Stderr, |s| s.blue()), message),
  }
}

/// JSON document printed for a successful run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessReport<'a> {
  name: &'a str,
  devfile_path: &'a Path,
  backend: BackendKind,
  starter: Option<&'a str>,
  telemetry: &'a BTreeMap<String, Value>,
}

/// JSON document printed for a failed run.
#[derive(Debug, Serialize)]
struct FailureReport<'a> {
  error: String,
  message: String,
  cleanup: String,
  telemetry: &'a BTreeMap<String, Value>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}

pub fn report_success(
  format: OutputFormat,
  result: &InitResult,
  telemetry: &BTreeMap<String, Value>,
) -> anyhow::Result<()> {
  if format.is_json() {
    return print_json(&SuccessReport {
      name: &result.name,
      devfile_path: &result.devfile_path,
      backend: result.backend,
      starter: result.starter.as_deref(),
      telemetry,
    });
  }

  println!(
    "{} Component {} initialized",
    "✓".if_supports_color(Stream::Stdout, |s| s.green()),
    result.name.bold()
  );
  print_field("Devfile", &result.devfile_path.display().to_string());
  if let Some(starter) = &result.starter {
    print_field("Starter project", starter);
  }
  println!();
  println!("{}", result.exit_message());
  Ok(())
}

pub fn report_failure(
  format: OutputFormat,
  failure: &InitFailure,
  telemetry: &BTreeMap<String, Value>,
) -> anyhow::Result<()> {
  if format.is_json() {
    return print_json(&failure_report(failure, telemetry));
  }

  notice(Notice::Error, &failure.source.to_string());
  let level = match failure.cleanup {
    Cleanup::Preserved => Notice::Warning,
    Cleanup::NothingWritten | Cleanup::DevfileRemoved => Notice::Info,
  };
  notice(level, &failure.cleanup.to_string());
  Ok(())
}

fn failure_report<'a>(failure: &InitFailure, telemetry: &'a BTreeMap<String, Value>) -> FailureReport<'a> {
  FailureReport {
    error: format!("{:?}", failure.kind()),
    message: failure.source.to_string(),
    cleanup: failure.cleanup.to_string(),
    telemetry,
  }
}

fn print_field(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}
