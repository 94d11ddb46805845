//! Implementation of the `devinit init` command.
//!
//! Bootstraps the current directory as a devfile component, either from
//! flags, by detecting existing sources, or interactively.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use devinit_lib::fs::DefaultFs;
use devinit_lib::init::flags::{FLAG_DEVFILE, FLAG_DEVFILE_PATH, FLAG_DEVFILE_REGISTRY, FLAG_NAME, FLAG_STARTER};
use devinit_lib::init::{Flags, InitClient, NoPrompt, Prompter, RunContext};
use devinit_lib::preference::Preferences;
use devinit_lib::registry::RegistryClient;

use crate::output::{OutputFormat, report_failure, report_success};
use crate::prompts::DialoguerPrompter;

/// Arguments of `devinit init`. Without any of them the command is interactive.
#[derive(Debug, Default, Args)]
pub struct InitArgs {
  /// Name of the component
  #[arg(long)]
  pub name: Option<String>,

  /// Name of the devfile stack to use from a registry
  #[arg(long)]
  pub devfile: Option<String>,

  /// Registry to fetch the devfile from (default: every configured registry, in order)
  #[arg(long)]
  pub devfile_registry: Option<String>,

  /// Path or URL of the devfile to use
  #[arg(long)]
  pub devfile_path: Option<String>,

  /// Starter project to download into the current directory
  #[arg(long)]
  pub starter: Option<String>,
}

impl InitArgs {
  fn flags(&self) -> Flags {
    let raw = [
      (FLAG_NAME, &self.name),
      (FLAG_DEVFILE, &self.devfile),
      (FLAG_DEVFILE_REGISTRY, &self.devfile_registry),
      (FLAG_DEVFILE_PATH, &self.devfile_path),
      (FLAG_STARTER, &self.starter),
    ];
    Flags::from_raw(
      raw
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value))),
    )
  }
}

/// Execute the init command. Returns the process exit code.
pub fn cmd_init(args: &InitArgs, format: OutputFormat) -> Result<i32> {
  let preferences = Preferences::load().context("Failed to load preferences")?;
  let registry = RegistryClient::from_preferences(&preferences).context("Failed to create HTTP client")?;
  debug!(registries = preferences.registries.len(), timeout = ?preferences.timeout, "loaded preferences");

  let flags = args.flags();
  let prompter: Arc<dyn Prompter> = if flags.is_empty() {
    Arc::new(DialoguerPrompter::default())
  } else {
    Arc::new(NoPrompt)
  };
  let client = InitClient::new(Arc::new(DefaultFs), registry, prompter);

  let ctx = RunContext::new();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let canceller = ctx.canceller();
  rt.spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      canceller.cancel();
    }
  });

  let outcome = rt.block_on(client.init(&ctx, flags));
  let telemetry = ctx.telemetry().snapshot();

  match outcome {
    Ok(result) => {
      report_success(format, &result, &telemetry)?;
      Ok(0)
    }
    Err(failure) => {
      report_failure(format, &failure, &telemetry)?;
      Ok(failure.exit_code())
    }
  }
}
