//! Backend that asks the user for every choice.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{BackendKind, InitBackend, stage_registry_devfile};
use crate::devfile::{DevfileObj, StarterProject};
use crate::fs::Filesystem;
use crate::init::context::RunContext;
use crate::init::error::InitError;
use crate::init::flags::Flags;
use crate::init::name::{default_name, validate_name};
use crate::init::prompt::{self, Prompter};
use crate::registry::{DevfileStack, RegistryClient};

/// Menu entry for stacks without a language.
const OTHER_LANGUAGE: &str = "Other";

/// First entry of the starter menu.
const NO_STARTER: &str = "none";

pub struct InteractiveBackend {
  fs: Arc<dyn Filesystem>,
  registry: Arc<RegistryClient>,
  prompter: Arc<dyn Prompter>,
}

impl InteractiveBackend {
  pub fn new(fs: Arc<dyn Filesystem>, registry: Arc<RegistryClient>, prompter: Arc<dyn Prompter>) -> Self {
    Self { fs, registry, prompter }
  }
}

fn language_of(stack: &DevfileStack) -> &str {
  if stack.language.is_empty() {
    OTHER_LANGUAGE
  } else {
    &stack.language
  }
}

#[async_trait]
impl InitBackend for InteractiveBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::Interactive
  }

  async fn select_and_personalize_devfile(
    &self,
    ctx: &RunContext,
    _flags: &Flags,
    dir: &Path,
  ) -> Result<(DevfileObj, PathBuf), InitError> {
    let prompter = self.prompter.as_ref();
    let registries = self.registry.registries();
    let registry = match registries {
      [] => {
        return Err(InitError::DevfileNotFound {
          name: "any stack".to_string(),
          registries: "none configured".to_string(),
        });
      }
      [only] => only,
      many => {
        let items: Vec<String> = many.iter().map(|r| format!("{} ({})", r.name, r.url)).collect();
        &many[prompt::select(ctx, prompter, "Select the devfile registry", &items, 0)?]
      }
    };

    let stacks = self.registry.index(ctx, registry).await?;
    if stacks.is_empty() {
      return Err(InitError::DevfileNotFound {
        name: "any stack".to_string(),
        registries: registry.name.clone(),
      });
    }

    let languages: Vec<String> = stacks
      .iter()
      .map(|s| language_of(s).to_string())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let language = &languages[prompt::select(ctx, prompter, "Select language", &languages, 0)?];

    let mut candidates: Vec<&DevfileStack> = stacks.iter().filter(|s| language_of(s) == language.as_str()).collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    let labels: Vec<String> = candidates.iter().map(|s| s.label()).collect();
    let stack = candidates[prompt::select(ctx, prompter, "Select project type", &labels, 0)?];
    debug!(registry = %registry.name, stack = %stack.name, "stack selected");

    stage_registry_devfile(self.fs.as_ref(), &self.registry, ctx, registry, stack, dir).await
  }

  async fn select_starter_project(
    &self,
    ctx: &RunContext,
    devfile: &DevfileObj,
    _flags: &Flags,
    _dir: &Path,
  ) -> Result<Option<StarterProject>, InitError> {
    let starters = devfile.starter_projects();
    if starters.is_empty() {
      return Ok(None);
    }

    let items: Vec<String> = std::iter::once(NO_STARTER.to_string())
      .chain(starters.iter().map(|s| match &s.description {
        Some(description) => format!("{}: {}", s.name, description),
        None => s.name.clone(),
      }))
      .collect();
    match prompt::select(ctx, self.prompter.as_ref(), "Which starter project do you want to use?", &items, 0)? {
      0 => Ok(None),
      i => Ok(starters.get(i - 1).cloned()),
    }
  }

  async fn personalize_name(
    &self,
    ctx: &RunContext,
    devfile: &DevfileObj,
    _flags: &Flags,
    dir: &Path,
  ) -> Result<String, InitError> {
    let default = default_name(devfile.metadata_name(), dir);
    loop {
      let answer = prompt::input(ctx, self.prompter.as_ref(), "Enter component name", &default)?;
      let answer = answer.trim();
      let name = if answer.is_empty() { default.as_str() } else { answer };
      match validate_name(name) {
        Ok(()) => return Ok(name.to_string()),
        Err(e) => self.prompter.info(&e.to_string()),
      }
    }
  }
}
