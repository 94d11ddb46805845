//! User interaction seam of the init pipeline.
//!
//! The library never talks to a terminal itself. The CLI plugs in a
//! terminal prompter; tests plug in a scripted one.

use super::context::RunContext;
use super::error::InitError;

/// Asks the user questions on behalf of the interactive backend.
///
/// `Ok(None)` means the user aborted the prompt (Esc, Ctrl-D) and surfaces
/// as [`InitError::UserAborted`].
pub trait Prompter: Send + Sync {
  /// Show an informational line.
  fn info(&self, message: &str);

  /// Pick one of `items`. Returns its index.
  fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>, InitError>;

  /// Free-form text input prefilled with `default`.
  fn input(&self, prompt: &str, default: &str) -> Result<Option<String>, InitError>;
}

/// Prompter for non-interactive runs: prints nothing and refuses every question.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
  fn info(&self, _message: &str) {}

  fn select(&self, prompt: &str, _items: &[String], _default: usize) -> Result<Option<usize>, InitError> {
    Err(InitError::Prompt(format!("cannot ask {prompt:?} in non-interactive mode")))
  }

  fn input(&self, prompt: &str, _default: &str) -> Result<Option<String>, InitError> {
    Err(InitError::Prompt(format!("cannot ask {prompt:?} in non-interactive mode")))
  }
}

/// Ask `prompter` to pick one of `items`, honouring cancellation on both sides of the prompt.
pub(crate) fn select(
  ctx: &RunContext,
  prompter: &dyn Prompter,
  prompt: &str,
  items: &[String],
  default: usize,
) -> Result<usize, InitError> {
  ctx.check_cancelled()?;
  let choice = prompter.select(prompt, items, default)?.ok_or(InitError::UserAborted)?;
  if choice >= items.len() {
    return Err(InitError::Prompt(format!("selection {choice} out of range for {prompt:?}")));
  }
  ctx.check_cancelled()?;
  Ok(choice)
}

pub(crate) fn input(ctx: &RunContext, prompter: &dyn Prompter, prompt: &str, default: &str) -> Result<String, InitError> {
  ctx.check_cancelled()?;
  let answer = prompter.input(prompt, default)?.ok_or(InitError::UserAborted)?;
  ctx.check_cancelled()?;
  Ok(answer)
}
