//! Backend for directories that already contain sources.
//!
//! The devfile is chosen by scoring every stack of every configured
//! registry against the detected languages and frameworks. No starter
//! project is ever selected, since the sources are already there.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{BackendKind, InitBackend, stage_registry_devfile};
use crate::detect::{self, Signals};
use crate::devfile::{DevfileObj, StarterProject};
use crate::fs::Filesystem;
use crate::init::context::RunContext;
use crate::init::error::InitError;
use crate::init::flags::Flags;
use crate::init::name::default_name;
use crate::init::prompt::Prompter;
use crate::registry::{DevfileStack, Registry, RegistryClient};

pub struct DetectionBackend {
  fs: Arc<dyn Filesystem>,
  registry: Arc<RegistryClient>,
  prompter: Arc<dyn Prompter>,
}

impl DetectionBackend {
  pub fn new(fs: Arc<dyn Filesystem>, registry: Arc<RegistryClient>, prompter: Arc<dyn Prompter>) -> Self {
    Self { fs, registry, prompter }
  }

  /// Best stack across all registries. Earlier registries win exact ties.
  async fn best_stack(&self, ctx: &RunContext, signals: &Signals, dir: &Path) -> Result<(Registry, DevfileStack), InitError> {
    let mut best: Option<(Registry, DevfileStack, u32)> = None;
    let mut first_error = None;

    for registry in self.registry.registries() {
      let stacks = match self.registry.index(ctx, registry).await {
        Ok(stacks) => stacks,
        Err(InitError::Cancelled) => return Err(InitError::Cancelled),
        Err(e) => {
          warn!(registry = %registry.name, error = %e, "skipping unreachable registry");
          first_error.get_or_insert(e);
          continue;
        }
      };
      let Some((stack, score)) = detect::best_match(signals, &stacks) else {
        continue;
      };
      let better = match &best {
        None => true,
        Some((_, current, current_score)) => {
          score > *current_score || (score == *current_score && stack.name < current.name)
        }
      };
      if better {
        best = Some((registry.clone(), stack.clone(), score));
      }
    }

    match (best, first_error) {
      (Some((registry, stack, score)), _) => {
        info!(registry = %registry.name, stack = %stack.name, score, "detected devfile");
        Ok((registry, stack))
      }
      (None, Some(e)) => Err(e),
      (None, None) => Err(InitError::DetectionFailed { dir: dir.to_path_buf() }),
    }
  }
}

#[async_trait]
impl InitBackend for DetectionBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::Detection
  }

  async fn select_and_personalize_devfile(
    &self,
    ctx: &RunContext,
    _flags: &Flags,
    dir: &Path,
  ) -> Result<(DevfileObj, PathBuf), InitError> {
    let signals = detect::scan(self.fs.as_ref(), dir)?;
    if signals.is_empty() {
      return Err(InitError::DetectionFailed { dir: dir.to_path_buf() });
    }

    let (registry, stack) = self.best_stack(ctx, &signals, dir).await?;
    let mut message = format!(
      "Based on the files in the current directory, the {} devfile was selected",
      stack.name
    );
    if !stack.language.is_empty() {
      message.push_str(&format!("\n  Language: {}", stack.language));
    }
    if !stack.project_type.is_empty() {
      message.push_str(&format!("\n  Project type: {}", stack.project_type));
    }
    self.prompter.info(&message);

    stage_registry_devfile(self.fs.as_ref(), &self.registry, ctx, &registry, &stack, dir).await
  }

  async fn select_starter_project(
    &self,
    _ctx: &RunContext,
    _devfile: &DevfileObj,
    _flags: &Flags,
    _dir: &Path,
  ) -> Result<Option<StarterProject>, InitError> {
    Ok(None)
  }

  async fn personalize_name(
    &self,
    _ctx: &RunContext,
    devfile: &DevfileObj,
    _flags: &Flags,
    dir: &Path,
  ) -> Result<String, InitError> {
    let signals = detect::scan(self.fs.as_ref(), dir)?;
    let candidates = signals.project_name.as_deref().into_iter().chain(devfile.metadata_name());
    Ok(default_name(candidates, dir))
  }
}
