mod cmd;
mod output;
mod prompts;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{InitArgs, cmd_init};
use crate::output::OutputFormat;

/// devinit - bootstrap a directory as a devfile component
#[derive(Parser)]
#[command(name = "devinit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Initialize the current directory as a component
  Init(InitArgs),
}

fn init_logging(verbose: bool) {
  let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
    Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
    _ if verbose => EnvFilter::new("warn,devinit=debug,devinit_lib=debug"),
    _ => EnvFilter::new("warn"),
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let code = match &cli.command {
    Commands::Init(args) => cmd_init(args, cli.output)?,
  };
  if code != 0 {
    std::process::exit(code);
  }
  Ok(())
}
