//! Terminal prompts for the interactive init backend.

use std::io::{self, IsTerminal};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use devinit_lib::init::{InitError, Prompter};

use crate::output::{Notice, notice};

/// [`Prompter`] backed by `dialoguer`.
///
/// Informational lines go to stderr so that `-o json` keeps stdout clean.
#[derive(Default)]
pub struct DialoguerPrompter {
  theme: ColorfulTheme,
}

impl DialoguerPrompter {
  fn ensure_terminal() -> Result<(), InitError> {
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
      return Err(InitError::Prompt(
        "cannot prompt in non-interactive mode, pass --devfile or --devfile-path".to_string(),
      ));
    }
    Ok(())
  }
}

/// Interrupted reads (Ctrl-C while a prompt is open) count as an abort.
fn aborted_or_failed<T>(err: dialoguer::Error) -> Result<Option<T>, InitError> {
  match err {
    dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
    other => Err(InitError::Prompt(other.to_string())),
  }
}

impl Prompter for DialoguerPrompter {
  fn info(&self, message: &str) {
    notice(Notice::Info, message);
  }

  fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>, InitError> {
    Self::ensure_terminal()?;
    Select::with_theme(&self.theme)
      .with_prompt(prompt)
      .items(items)
      .default(default)
      .interact_opt()
      .or_else(aborted_or_failed)
  }

  fn input(&self, prompt: &str, default: &str) -> Result<Option<String>, InitError> {
    Self::ensure_terminal()?;
    Input::<String>::with_theme(&self.theme)
      .with_prompt(prompt)
      .default(default.to_string())
      .interact_text()
      .map(Some)
      .or_else(aborted_or_failed)
  }
}
