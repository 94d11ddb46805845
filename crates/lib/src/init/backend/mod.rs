//! Init backends: where the devfile, starter and name come from.
//!
//! Exactly one backend serves an invocation, chosen by
//! [`BackendKind::select`]:
//! - flags: some flags were given
//! - detection: no flags, and the directory already holds sources
//! - interactive: no flags, and the directory is empty

mod detection;
mod flags;
mod interactive;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub use detection::DetectionBackend;
pub use flags::FlagsBackend;
pub use interactive::InteractiveBackend;

use super::context::RunContext;
use super::error::InitError;
use super::flags::Flags;
use crate::devfile::{DevfileObj, StarterProject};
use crate::fs::Filesystem;
use crate::registry::{DevfileStack, Registry, RegistryClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  Flags,
  Detection,
  Interactive,
}

impl BackendKind {
  /// Pick the backend for `flags` in a directory that is (or is not) empty.
  pub fn select(flags: &Flags, dir_is_empty: bool) -> Self {
    if !flags.is_empty() {
      BackendKind::Flags
    } else if !dir_is_empty {
      BackendKind::Detection
    } else {
      BackendKind::Interactive
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      BackendKind::Flags => "flags",
      BackendKind::Detection => "detection",
      BackendKind::Interactive => "interactive",
    }
  }
}

impl fmt::Display for BackendKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One strategy for acquiring and personalising a devfile.
#[async_trait]
pub trait InitBackend: Send + Sync {
  fn kind(&self) -> BackendKind;

  /// Whether this backend serves an invocation with `flags`.
  fn handles(&self, flags: &Flags, dir_is_empty: bool) -> bool {
    BackendKind::select(flags, dir_is_empty) == self.kind()
  }

  /// Acquire a devfile and stage it as `devfile.yaml` in `dir`.
  async fn select_and_personalize_devfile(
    &self,
    ctx: &RunContext,
    flags: &Flags,
    dir: &Path,
  ) -> Result<(DevfileObj, PathBuf), InitError>;

  /// The starter project to overlay, if any.
  async fn select_starter_project(
    &self,
    ctx: &RunContext,
    devfile: &DevfileObj,
    flags: &Flags,
    dir: &Path,
  ) -> Result<Option<StarterProject>, InitError>;

  /// The component name. Never writes.
  async fn personalize_name(
    &self,
    ctx: &RunContext,
    devfile: &DevfileObj,
    flags: &Flags,
    dir: &Path,
  ) -> Result<String, InitError>;
}

/// Download stack `stack` from `registry` and stage it in `dir`.
pub(crate) async fn stage_registry_devfile(
  fs: &dyn Filesystem,
  client: &RegistryClient,
  ctx: &RunContext,
  registry: &Registry,
  stack: &DevfileStack,
  dir: &Path,
) -> Result<(DevfileObj, PathBuf), InitError> {
  let content = client.devfile(ctx, registry, &stack.name).await?;
  ctx.check_cancelled()?;
  let origin = format!("{}/{}", registry.name, stack.name);
  let devfile = DevfileObj::stage(fs, dir, &content, &origin)?;
  info!(registry = %registry.name, stack = %stack.name, "devfile staged");
  let path = devfile.path().to_path_buf();
  Ok((devfile, path))
}
